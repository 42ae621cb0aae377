use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the padel league backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::participants::login,
        crate::routes::participants::participant_info,
        crate::routes::availability::get_availability,
        crate::routes::availability::replace_availability,
        crate::routes::fixtures::participant_fixtures,
        crate::routes::fixtures::participant_candidates,
        crate::routes::fixtures::group_candidates,
        crate::routes::fixtures::advance_group,
        crate::routes::fixtures::confirm_fixture,
        crate::routes::fixtures::edit_fixture,
        crate::routes::fixtures::cancel_fixture,
        crate::routes::fixtures::close_fixture,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::participant::LoginRequest,
            crate::dto::participant::ParticipantResponse,
            crate::dto::availability::WindowDto,
            crate::dto::availability::ReplaceAvailabilityRequest,
            crate::dto::availability::AvailabilityResponse,
            crate::dto::fixture::ScheduleRequest,
            crate::dto::fixture::FixtureResponse,
            crate::dto::fixture::ParticipantFixturesResponse,
            crate::dto::fixture::CandidateDto,
            crate::dto::fixture::FixtureCandidatesResponse,
            crate::dto::fixture::AdvanceResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "participants", description = "Login and participant details"),
        (name = "availability", description = "Weekly availability windows"),
        (name = "fixtures", description = "Fixtures, match candidates and scheduling"),
    )
)]
/// OpenAPI document of every league route.
pub struct ApiDoc;
