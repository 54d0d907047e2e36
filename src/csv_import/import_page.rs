use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    alert::ALERT_CONTAINER_ID,
    csv_import::financisto::FINANCISTO_COLUMNS,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
};

/// What each Financisto column holds.
fn column_description(column: &str) -> &'static str {
    match column {
        "date" => "YYYY-MM-DD",
        "time" => "HH:MM:SS",
        "account" => "Created with the row's currency if new",
        "amount" => "Negative for money out",
        "currency" => "Three letter code, e.g. GBP",
        "category" => "Optional",
        "parent" => "Parent of the category, optional",
        "payee" | "location" | "project" => "Optional, created if new",
        "note" => "Optional free text",
        _ => "",
    }
}

fn upload_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::IMPORT)
            enctype="multipart/form-data"
            hx-disabled-elt="#files, #upload-button"
            hx-indicator="#upload-indicator"
            hx-swap="none"
            hx-target-error={ "#" (ALERT_CONTAINER_ID) }
            class="space-y-4"
        {
            label for="files" class=(FORM_LABEL_STYLE) { "Financisto CSV export(s)" }

            input
                id="files"
                name="files"
                type="file"
                accept="text/csv"
                multiple
                required
                class=(FORM_TEXT_INPUT_STYLE);

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Rows imported by an earlier upload are skipped, so the same export "
                "can be uploaded again after adding to it."
            }

            button type="submit" id="upload-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="upload-indicator" { (loading_spinner()) }
                " Import"
            }
        }
    }
}

fn columns_table() -> Markup {
    html! {
        table class="w-full text-sm text-left"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class="px-6 py-3" { "Column" }
                    th scope="col" class="px-6 py-3" { "Contents" }
                }
            }

            tbody
            {
                @for column in FINANCISTO_COLUMNS {
                    tr class="border-b dark:border-gray-700"
                    {
                        td class={ (TABLE_CELL_STYLE) " font-mono" } { (column) }
                        td class=(TABLE_CELL_STYLE) { (column_description(column)) }
                    }
                }
            }
        }
    }
}

fn import_view() -> Markup {
    let content = html! {
        (NavBar::new(endpoints::IMPORT_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Import from Financisto" }

                section class=(CARD_STYLE) { (upload_form()) }

                section class={ (CARD_STYLE) " overflow-x-auto" }
                {
                    h2 class="mb-2 font-semibold" { "Expected columns" }
                    p class="mb-4 text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Other columns in the file are ignored. "
                        a href=(endpoints::EXPORT) download class=(LINK_STYLE)
                        {
                            "Exporting"
                        }
                        " writes the same layout."
                    }

                    (columns_table())
                }
            }
        }
    };

    base("Import Transactions", &[], &content)
}

/// Route handler for the Financisto import page.
pub async fn get_import_page() -> Response {
    import_view().into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use scraper::{ElementRef, Selector};

    use crate::{
        csv_import::{financisto::FINANCISTO_COLUMNS, import_page::get_import_page},
        endpoints,
        test_utils::{
            assert_content_type, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn form_uploads_csv_files() {
        let response = get_import_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::IMPORT, "hx-post");
        assert_eq!(form.value().attr("enctype"), Some("multipart/form-data"));
        assert_csv_file_input(&form, "files");
        assert_form_submit_button(&form);
    }

    #[tokio::test]
    async fn table_lists_every_column_in_order() {
        let html = parse_html_document(get_import_page().await).await;

        let columns: Vec<String> = html
            .select(&Selector::parse("tbody tr td:first-child").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect();

        assert_eq!(columns, FINANCISTO_COLUMNS);
    }

    #[track_caller]
    fn assert_csv_file_input(form: &ElementRef, name: &str) {
        let selector = Selector::parse(&format!("input[name={name}]")).unwrap();
        let input = form
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No input found with name \"{name}\""));
        let input = input.value();

        assert_eq!(input.attr("type"), Some("file"));
        assert_eq!(input.attr("accept"), Some("text/csv"));
        assert!(input.attr("multiple").is_some(), "want multiple files");
        assert!(input.attr("required").is_some(), "want a required input");
    }
}
