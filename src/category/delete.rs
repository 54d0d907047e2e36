//! Category deletion endpoint.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    category::{CategoryId, create::CategoryState, delete_category},
};

/// Handle category deletion. Returns success alert or error.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        category::{NewCategory, create::CategoryState, create_category, delete_category_endpoint},
        db::initialize,
        name::Name,
    };

    #[tokio::test]
    async fn delete_category_endpoint_succeeds_then_not_found() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let category = create_category(
            &NewCategory {
                name: Name::new_unchecked("Food"),
                parent_id: None,
                kind: None,
            },
            &connection,
        )
        .unwrap();
        let state = CategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = delete_category_endpoint(Path(category.id), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = delete_category_endpoint(Path(category.id), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
