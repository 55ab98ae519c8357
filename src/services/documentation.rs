use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for FanXI Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::catalog::list_leagues,
        crate::routes::catalog::list_teams,
        crate::routes::catalog::list_team_matches,
        crate::routes::catalog::get_match,
        crate::routes::predictions::submit_prediction,
        crate::routes::predictions::list_match_predictions,
        crate::routes::predictions::list_user_predictions,
        crate::routes::predictions::get_leaderboard,
        crate::routes::predictions::get_summary,
        crate::routes::predictions::get_user_score,
        crate::routes::predictions::get_official_result,
        crate::routes::admin::set_official_result,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::catalog::LeagueResponse,
            crate::dto::catalog::TeamResponse,
            crate::dto::catalog::MatchResponse,
            crate::dto::prediction::SubmitPredictionRequest,
            crate::dto::prediction::PlayerInput,
            crate::dto::prediction::SubmitPredictionResponse,
            crate::dto::prediction::PredictionResponse,
            crate::dto::prediction::PlayerSlotResponse,
            crate::dto::prediction::PredictionScoreResponse,
            crate::dto::prediction::LeaderboardResponse,
            crate::dto::prediction::MatchSummaryResponse,
            crate::dto::official::OfficialResultRequest,
            crate::dto::official::OfficialResultResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Leagues, teams and fixtures"),
        (name = "predictions", description = "Lineup prediction intake"),
        (name = "scoring", description = "Leaderboards, summaries and official results"),
        (name = "admin", description = "Official result administration"),
    )
)]
pub struct ApiDoc;
