//! A page collecting the occasional housekeeping jobs.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    alert::ALERT_CONTAINER_ID,
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, CARD_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
};

struct MaintenanceTask {
    title: &'static str,
    description: &'static str,
    button_text: &'static str,
    endpoint: &'static str,
}

const TASKS: [MaintenanceTask; 5] = [
    MaintenanceTask {
        title: "Back up the database",
        description: "Write a copy of the database to the backup directory.",
        button_text: "Back Up",
        endpoint: endpoints::BACKUP,
    },
    MaintenanceTask {
        title: "Recalculate balances",
        description: "Rebuild every account and running balance from the transactions.",
        button_text: "Recalculate",
        endpoint: endpoints::RECALCULATE_BALANCES,
    },
    MaintenanceTask {
        title: "Refresh payee statistics",
        description: "Recount the most used category, location and project for each payee.",
        button_text: "Refresh",
        endpoint: endpoints::PAYEE_STATISTICS,
    },
    MaintenanceTask {
        title: "Deduplicate categories",
        description: "Merge categories with the same name and parent, \
            moving their transactions to the oldest one.",
        button_text: "Deduplicate",
        endpoint: endpoints::DEDUPLICATE_CATEGORIES,
    },
    MaintenanceTask {
        title: "Update exchange rates",
        description: "Download the latest rates from the European Central Bank.",
        button_text: "Update",
        endpoint: endpoints::UPDATE_EXCHANGE_RATES,
    },
];

fn task_card(task: &MaintenanceTask) -> Markup {
    html! {
        div class={ (CARD_STYLE) " flex flex-wrap items-center justify-between gap-4" }
        {
            div
            {
                h2 class="font-semibold" { (task.title) }
                p class="text-sm text-gray-500 dark:text-gray-400" { (task.description) }
            }

            div class="w-40"
            {
                button
                    type="button"
                    hx-post=(task.endpoint)
                    hx-swap="none"
                    hx-target-error={ "#" (ALERT_CONTAINER_ID) }
                    hx-disabled-elt="this"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    (task.button_text)
                }
            }
        }
    }
}

fn maintenance_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::MAINTENANCE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-4 lg:max-w-3xl lg:mx-auto"
            {
                h1 class="text-xl font-bold" { "Maintenance" }

                @for task in &TASKS {
                    (task_card(task))
                }

                div class={ (CARD_STYLE) " flex flex-wrap items-center justify-between gap-4" }
                {
                    div
                    {
                        h2 class="font-semibold" { "Export transactions" }
                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            "Download every transaction as a CSV file that can be imported again."
                        }
                    }

                    div class="w-40"
                    {
                        a href=(endpoints::EXPORT) download class=(BUTTON_SECONDARY_STYLE)
                        {
                            "Export CSV"
                        }
                    }
                }
            }
        }
    };

    base("Maintenance", &[], &content)
}

pub async fn get_maintenance_page() -> Response {
    maintenance_view().into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::{
        endpoints,
        maintenance::get_maintenance_page,
        test_utils::{assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn every_task_has_a_button() {
        let response = get_maintenance_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let endpoints_posted: Vec<&str> = html
            .select(&Selector::parse("button[hx-post]").unwrap())
            .filter_map(|button| button.value().attr("hx-post"))
            .collect();
        assert_eq!(
            endpoints_posted,
            [
                endpoints::BACKUP,
                endpoints::RECALCULATE_BALANCES,
                endpoints::PAYEE_STATISTICS,
                endpoints::DEDUPLICATE_CATEGORIES,
                endpoints::UPDATE_EXCHANGE_RATES,
            ]
        );

        let export_link = html
            .select(&Selector::parse("a[download]").unwrap())
            .next()
            .expect("missing export link");
        assert_eq!(export_link.value().attr("href"), Some(endpoints::EXPORT));
    }
}
