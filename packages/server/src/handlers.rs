//! HTTP handler functions for the tree census API.

use actix_web::{HttpResponse, web};
use tree_census_models::Borough;
use tree_census_server_models::{
    ApiChart, ApiError, ApiHealth, ApiOption, ApiOptions, ApiSlider, SpeciesChartQueryParams,
    StewardChartQueryParams,
};
use tree_census_views::chart::{
    ChartRenderer as _, ChartSpec, PlotlyRenderer, SPECIES_CHART_HEIGHT, STEWARD_CHART_HEIGHT,
};
use tree_census_views::species::{SpeciesViewParams, species_by_borough};
use tree_census_views::steward::{StewardViewParams, steward_by_species};
use tree_census_views::{MinCount, Normalization, SortPolicy};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        rows: state.census.dataset().len(),
        species: state.census.tables().species_count(),
    })
}

/// `GET /api/options`
///
/// Returns the choices for every dashboard control.
pub async fn options(state: web::Data<AppState>) -> HttpResponse {
    let tables = state.census.tables();

    let boroughs = Borough::all()
        .iter()
        .map(|b| ApiOption {
            label: b.to_string(),
            value: b.code(),
        })
        .collect();

    let species = tables
        .species_codes()
        .map(|code| ApiOption {
            label: tables.species_label(code).to_string(),
            value: code.0,
        })
        .collect();

    let sort_policies = SortPolicy::all()
        .iter()
        .map(|s| ApiOption {
            label: s.description().to_string(),
            value: *s,
        })
        .collect();

    let normalizations = Normalization::all()
        .iter()
        .map(|n| ApiOption {
            label: n.to_string(),
            value: *n,
        })
        .collect();

    HttpResponse::Ok().json(ApiOptions {
        boroughs,
        species,
        sort_policies,
        normalizations,
        min_count: ApiSlider {
            min: MinCount::MIN,
            max: MinCount::MAX,
            step: MinCount::STEP,
            default: MinCount::MIN,
        },
    })
}

/// `GET /api/charts/species-health`
///
/// Health of every species, optionally within one borough.
pub async fn species_chart(
    state: web::Data<AppState>,
    params: web::Query<SpeciesChartQueryParams>,
) -> HttpResponse {
    let min_count = match MinCount::new(params.min_count.unwrap_or(MinCount::MIN)) {
        Ok(min_count) => min_count,
        Err(e) => {
            log::debug!("Rejecting species chart request: {e}");
            return HttpResponse::BadRequest().json(ApiError {
                error: e.to_string(),
            });
        }
    };

    let view = SpeciesViewParams {
        borough: params.borough,
        sort: params.sort.unwrap_or_default(),
        normalization: params.mode.unwrap_or_default(),
        min_count,
    };

    let table = species_by_borough(&state.census, &view);
    let figure = PlotlyRenderer.render(&ChartSpec::health_stack(&table, SPECIES_CHART_HEIGHT));

    HttpResponse::Ok().json(ApiChart::new(&table, figure))
}

/// `GET /api/charts/steward-health`
///
/// Health by steward level, optionally within one borough and species.
pub async fn steward_chart(
    state: web::Data<AppState>,
    params: web::Query<StewardChartQueryParams>,
) -> HttpResponse {
    let view = StewardViewParams {
        borough: params.borough,
        species: params.species,
    };

    let table = steward_by_species(&state.census, &view);
    let figure = PlotlyRenderer.render(&ChartSpec::health_stack(&table, STEWARD_CHART_HEIGHT));

    HttpResponse::Ok().json(ApiChart::new(&table, figure))
}
