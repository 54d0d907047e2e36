//! The form shared by the create and edit account pages.

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    account::{Account, NewAccount},
    alert::ALERT_CONTAINER_ID,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    money::{CurrencyCode, REFERENCE_CURRENCY},
    name::Name,
};

/// The form data for creating or updating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountForm {
    pub name: String,
    pub kind: Option<String>,
    pub currency: Option<String>,
    pub initial_balance: Option<f64>,
    /// Checkboxes are only sent when ticked.
    pub is_active: Option<String>,
}

impl AccountForm {
    /// Validate the form data.
    ///
    /// # Errors
    /// Returns an error if the name is empty or the currency code is invalid.
    pub fn validate(self) -> Result<NewAccount, Error> {
        let currency = match self.currency.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => CurrencyCode::new(code)?,
            _ => CurrencyCode::reference(),
        };

        Ok(NewAccount {
            name: Name::new(&self.name, "Account")?,
            kind: self
                .kind
                .map(|kind| kind.trim().to_owned())
                .filter(|kind| !kind.is_empty()),
            currency,
            initial_balance: self.initial_balance.unwrap_or(0.0),
            is_active: self.is_active.is_some(),
        })
    }
}

/// How the account form should be submitted.
pub enum AccountFormAction<'a> {
    Create { endpoint: &'a str },
    Update { endpoint: &'a str },
}

pub fn account_form_view(action: AccountFormAction<'_>, account: Option<&Account>) -> Markup {
    let name = account.map(|account| account.name.as_ref()).unwrap_or("");
    let kind = account
        .and_then(|account| account.kind.as_deref())
        .unwrap_or("");
    let currency = account
        .map(|account| account.currency.as_ref())
        .unwrap_or(REFERENCE_CURRENCY);
    let initial_balance = account
        .map(|account| format!("{:.2}", account.initial_balance))
        .unwrap_or_else(|| "0.00".to_owned());
    let is_active = account.is_none_or(|account| account.is_active);

    let (hx_post, hx_put, submit_text) = match action {
        AccountFormAction::Create { endpoint } => (Some(endpoint), None, "Create Account"),
        AccountFormAction::Update { endpoint } => (None, Some(endpoint), "Save Changes"),
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
                    placeholder="Current Account"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

                input
                    id="kind"
                    type="text"
                    name="kind"
                    list="account-kinds"
                    placeholder="bank"
                    value=(kind)
                    class=(FORM_TEXT_INPUT_STYLE);

                datalist id="account-kinds"
                {
                    option value="bank" {}
                    option value="cash" {}
                    option value="credit card" {}
                    option value="savings" {}
                }
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                input
                    id="currency"
                    type="text"
                    name="currency"
                    minlength="3"
                    maxlength="3"
                    value=(currency)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="initial_balance" class=(FORM_LABEL_STYLE) { "Initial Balance" }

                input
                    id="initial_balance"
                    type="number"
                    name="initial_balance"
                    step="0.01"
                    value=(initial_balance)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-2"
            {
                input
                    id="is_active"
                    type="checkbox"
                    name="is_active"
                    checked[is_active];

                label for="is_active" class="text-sm font-medium" { "Active" }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, account::form::AccountForm, money::CurrencyCode};

    #[test]
    fn empty_currency_defaults_to_gbp() {
        let form: AccountForm =
            serde_html_form::from_str("name=Cash&kind=&currency=&initial_balance=10").unwrap();

        let account = form.validate().unwrap();

        assert_eq!(account.currency, CurrencyCode::new("GBP").unwrap());
        assert_eq!(account.kind, None);
        assert!(!account.is_active);
    }

    #[test]
    fn checkbox_sets_active() {
        let form: AccountForm =
            serde_html_form::from_str("name=Cash&currency=eur&is_active=on").unwrap();

        let account = form.validate().unwrap();

        assert!(account.is_active);
        assert_eq!(account.currency.as_ref(), "EUR");
        assert_eq!(account.initial_balance, 0.0);
    }

    #[test]
    fn blank_name_is_rejected() {
        let form: AccountForm = serde_html_form::from_str("name=%20&currency=GBP").unwrap();

        assert_eq!(form.validate(), Err(Error::EmptyName("Account")));
    }
}
