#![allow(missing_docs)]

pub(crate) mod balance;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use balance::assert_balances_match_rebuild;
pub(crate) use form::{
    assert_form_input, assert_form_input_with_value, assert_form_submit_button,
    assert_hx_endpoint, must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{assert_content_type, assert_hx_redirect, get_header, response_json};
