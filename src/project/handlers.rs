//! Project pages and endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::{ALERT_CONTAINER_ID, Alert},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, edit_delete_action_links,
    },
    name::Name,
    navigation::NavBar,
    project::{
        NewProject, Project, ProjectId, create_project, delete_project, get_all_projects,
        get_project, update_project,
    },
};

#[derive(Debug, Clone)]
pub struct ProjectState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProjectState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectForm {
    pub name: String,
    pub description: Option<String>,
}

impl ProjectForm {
    pub fn validate(self) -> Result<NewProject, Error> {
        Ok(NewProject {
            name: Name::new(&self.name, "Project")?,
            description: self
                .description
                .map(|description| description.trim().to_owned())
                .filter(|description| !description.is_empty()),
        })
    }
}

pub async fn get_projects_page(State(state): State<ProjectState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let projects = get_all_projects(&connection)
        .inspect_err(|error| tracing::error!("could not get projects: {error}"))?;

    Ok(projects_view(&projects).into_response())
}

pub async fn get_projects_json(State(state): State<ProjectState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_all_projects(&connection) {
        Ok(projects) => Json(projects).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn get_new_project_page() -> Response {
    let form = project_form_view(endpoints::PROJECTS_API, "hx-post", None);

    project_form_page("New Project", form).into_response()
}

pub async fn get_edit_project_page(
    Path(project_id): Path<ProjectId>,
    State(state): State<ProjectState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let project = get_project(project_id, &connection)?;
    let form = project_form_view(
        &format_endpoint(endpoints::PROJECT, project_id),
        "hx-put",
        Some(&project),
    );

    Ok(project_form_page("Edit Project", form).into_response())
}

pub async fn create_project_endpoint(
    State(state): State<ProjectState>,
    Form(form): Form<ProjectForm>,
) -> Response {
    let project = match form.validate() {
        Ok(project) => project,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_project(&project, &connection) {
        Ok(_) => redirect_to_projects(),
        Err(error) => {
            tracing::warn!("Could not create project: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn update_project_endpoint(
    Path(project_id): Path<ProjectId>,
    State(state): State<ProjectState>,
    Form(form): Form<ProjectForm>,
) -> Response {
    let project = match form.validate() {
        Ok(project) => project,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_project(project_id, &project, &connection) {
        Ok(()) => redirect_to_projects(),
        Err(error) => {
            tracing::warn!("Could not update project {project_id}: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn delete_project_endpoint(
    Path(project_id): Path<ProjectId>,
    State(state): State<ProjectState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_project(project_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Project deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete project {project_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn redirect_to_projects() -> Response {
    (
        HxRedirect(endpoints::PROJECTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

fn project_form_view(endpoint: &str, hx_method: &str, project: Option<&Project>) -> Markup {
    let name = project.map(|project| project.name.as_ref()).unwrap_or("");
    let description = project
        .and_then(|project| project.description.as_deref())
        .unwrap_or("");
    let (hx_post, hx_put, submit_text) = if hx_method == "hx-put" {
        (None, Some(endpoint), "Save Changes")
    } else {
        (Some(endpoint), None, "Create Project")
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error={ "#" (ALERT_CONTAINER_ID) }
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Summer Holiday"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                textarea
                    id="description"
                    name="description"
                    rows="3"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (description)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

fn project_form_page(title: &str, form: Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROJECTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { (title) }
            (form)
        }
    };

    base(title, &[], &content)
}

fn projects_view(projects: &[Project]) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROJECTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-3xl lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Projects" }

                    a href=(endpoints::NEW_PROJECT_VIEW) class=(LINK_STYLE) { "Add Project" }
                }

                ul class="space-y-4"
                {
                    @for project in projects {
                        li class=(CARD_STYLE) data-project-card="true"
                        {
                            h2 class="text-sm font-semibold text-gray-900 dark:text-white"
                            { (project.name) }

                            @if let Some(description) = &project.description {
                                p class="mt-1 text-sm text-gray-500 dark:text-gray-400"
                                { (description) }
                            }

                            div class="mt-2 text-sm"
                            {
                                (edit_delete_action_links(
                                    &format_endpoint(endpoints::EDIT_PROJECT_VIEW, project.id),
                                    &format_endpoint(endpoints::PROJECT, project.id),
                                    &format!("Are you sure you want to delete the project '{}'?", project.name),
                                    "closest [data-project-card='true']",
                                    "outerHTML",
                                ))
                            }
                        }
                    }

                    @if projects.is_empty() {
                        li class="text-center text-sm text-gray-500 dark:text-gray-400"
                        { "No projects yet." }
                    }
                }
            }
        }
    };

    base("Projects", &[], &content)
}
