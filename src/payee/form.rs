//! The form shared by the create and edit payee pages.

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::ALERT_CONTAINER_ID,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    name::Name,
};

#[derive(Debug, Clone, Deserialize)]
pub struct PayeeForm {
    pub name: String,
}

impl PayeeForm {
    pub fn validate(self) -> Result<Name, Error> {
        Name::new(&self.name, "Payee")
    }
}

pub fn payee_form_view(endpoint: &str, hx_method: &str, name: &str, submit_text: &str) -> Markup {
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
                    placeholder="Supermarket"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
