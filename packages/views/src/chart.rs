//! Chart rendering boundary.
//!
//! A [`ChartSpec`] describes a horizontal stacked bar chart over a
//! [`ChartTable`]. [`ChartRenderer`] implementations turn that description
//! into something a rendering surface can draw; [`PlotlyRenderer`] produces
//! a Plotly figure (`{"data": [...], "layout": {...}}`) for plotly.js.

use serde_json::{Value, json};
use tree_census_models::Health;

use crate::{ChartTable, FULL_COUNT_FIELD, HEALTH_FIELD};

/// Layout height of the species chart, tall enough for one tick per species.
pub const SPECIES_CHART_HEIGHT: u32 = 3000;
/// Layout height of the steward chart (four categories).
pub const STEWARD_CHART_HEIGHT: u32 = 200;

/// Fixed bar color of a health rating.
#[must_use]
pub const fn health_color(health: Health) -> &'static str {
    match health {
        Health::Good => "rgb(58,183,129)",
        Health::Fair => "rgb(200,170,60)",
        Health::Poor => "rgb(120,40,40)",
    }
}

/// What the hover label shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverSpec {
    /// Decimal places for the value field.
    pub value_decimals: u8,
    /// Whether the category's full count is listed.
    pub show_full_count: bool,
    /// Whether the health rating is listed (it is already the trace name).
    pub show_health: bool,
}

impl Default for HoverSpec {
    fn default() -> Self {
        Self {
            value_decimals: 2,
            show_full_count: true,
            show_health: false,
        }
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec<'a> {
    /// Chart rows and category order.
    pub table: &'a ChartTable,
    /// Field the bars are colored by.
    pub color_field: &'static str,
    /// Segments stack instead of grouping side by side.
    pub stacked: bool,
    /// Hover label contents. The category is always the hover title.
    pub hover: HoverSpec,
    /// Layout height in pixels.
    pub height: u32,
}

impl<'a> ChartSpec<'a> {
    /// Horizontal stacked bar chart colored by health rating.
    #[must_use]
    pub fn health_stack(table: &'a ChartTable, height: u32) -> Self {
        Self {
            table,
            color_field: HEALTH_FIELD,
            stacked: true,
            hover: HoverSpec::default(),
            height,
        }
    }
}

/// Turns a [`ChartSpec`] into a drawable output.
pub trait ChartRenderer {
    /// What the renderer produces.
    type Output;

    /// Renders the chart.
    fn render(&self, spec: &ChartSpec<'_>) -> Self::Output;
}

/// Renders Plotly figure JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotlyRenderer;

impl PlotlyRenderer {
    fn hover_template(spec: &ChartSpec<'_>) -> String {
        let table = spec.table;
        let mut template = format!(
            "<b>%{{hovertext}}</b><br><br>{}=%{{x:.{}f}}",
            table.value_field, spec.hover.value_decimals
        );
        if spec.hover.show_health {
            template.push_str(&format!("<br>{}=%{{fullData.name}}", spec.color_field));
        }
        if spec.hover.show_full_count {
            template.push_str(&format!("<br>{FULL_COUNT_FIELD}=%{{customdata[0]}}"));
        }
        template.push_str("<extra></extra>");
        template
    }

    fn trace(spec: &ChartSpec<'_>, health: Health, template: &str) -> Option<Value> {
        let rows: Vec<_> = spec
            .table
            .rows
            .iter()
            .filter(|row| row.health == health)
            .collect();
        if rows.is_empty() {
            return None;
        }

        let label = health.to_string();
        Some(json!({
            "type": "bar",
            "orientation": "h",
            "name": label,
            "legendgroup": label,
            "marker": { "color": health_color(health) },
            "x": rows.iter().map(|r| r.value.as_f64()).collect::<Vec<_>>(),
            "y": rows.iter().map(|r| r.category.as_str()).collect::<Vec<_>>(),
            "hovertext": rows.iter().map(|r| r.category.as_str()).collect::<Vec<_>>(),
            "customdata": rows.iter().map(|r| [r.full_count]).collect::<Vec<_>>(),
            "hovertemplate": template,
            "showlegend": true,
        }))
    }
}

impl ChartRenderer for PlotlyRenderer {
    type Output = Value;

    fn render(&self, spec: &ChartSpec<'_>) -> Value {
        let table = spec.table;
        let template = Self::hover_template(spec);
        let barmode = if spec.stacked { "stack" } else { "group" };

        // Good, Fair, Poor: the order the segments appear in the table.
        let data: Vec<Value> = Health::all()
            .iter()
            .rev()
            .filter_map(|health| Self::trace(spec, *health, &template))
            .collect();

        json!({
            "data": data,
            "layout": {
                "barmode": barmode,
                "height": spec.height,
                "margin": { "t": 0, "b": 0 },
                "legend": { "title": { "text": spec.color_field }, "tracegroupgap": 0 },
                "xaxis": { "title": { "text": table.value_field } },
                "yaxis": {
                    "title": { "text": table.category_field },
                    "dtick": 1,
                    "categoryorder": "array",
                    "categoryarray": table.category_order,
                },
            },
        })
    }
}
