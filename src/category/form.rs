//! The form shared by the create and edit category pages.

use maud::{Markup, html};
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::{
    Error,
    alert::ALERT_CONTAINER_ID,
    category::{Category, CategoryId, CategoryKind, NewCategory},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
    name::Name,
};

/// The form data for creating or updating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub parent_id: Option<CategoryId>,
    /// The "Unspecified" option posts an empty string.
    #[serde(default, deserialize_with = "deserialize_optional_kind")]
    pub kind: Option<CategoryKind>,
}

fn deserialize_optional_kind<'de, D>(deserializer: D) -> Result<Option<CategoryKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let kind = Option::<String>::deserialize(deserializer)?;

    match kind.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("expense") => Ok(Some(CategoryKind::Expense)),
        Some("income") => Ok(Some(CategoryKind::Income)),
        Some(other) => Err(D::Error::custom(format!(
            "unknown category type \"{other}\", expected \"expense\" or \"income\""
        ))),
    }
}

impl CategoryForm {
    pub fn validate(self) -> Result<NewCategory, Error> {
        Ok(NewCategory {
            name: Name::new(&self.name, "Category")?,
            parent_id: self.parent_id,
            kind: self.kind,
        })
    }
}

/// Renders the category form.
///
/// `parents` are the top-level categories that may be chosen as the parent.
/// `hx_method` is either "hx-post" or "hx-put".
pub fn category_form_view(
    endpoint: &str,
    hx_method: &str,
    category: Option<&Category>,
    parents: &[Category],
    submit_text: &str,
) -> Markup {
    let name = category.map(|category| category.name.as_ref()).unwrap_or("");
    let parent_id = category.and_then(|category| category.parent_id);
    let kind = category.and_then(|category| category.kind);
    let (hx_post, hx_put) = if hx_method == "hx-put" {
        (None, Some(endpoint))
    } else {
        (Some(endpoint), None)
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
                    placeholder="Groceries"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="parent_id" class=(FORM_LABEL_STYLE) { "Parent Category" }

                select id="parent_id" name="parent_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[parent_id.is_none()] { "None (top-level)" }

                    @for parent in parents {
                        option value=(parent.id) selected[parent_id == Some(parent.id)]
                        {
                            (parent.name)
                        }
                    }
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for (value, label, option) in [
                        ("", "Unspecified", None),
                        ("expense", "Expense", Some(CategoryKind::Expense)),
                        ("income", "Income", Some(CategoryKind::Income)),
                    ] {
                        div class="flex-1"
                        {
                            input
                                id={ "kind-" (label) }
                                type="radio"
                                name="kind"
                                value=(value)
                                checked[kind == option]
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for={ "kind-" (label) } class=(FORM_RADIO_LABEL_STYLE)
                            {
                                (label)
                            }
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
