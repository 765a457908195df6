use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters `encodeURIComponent` escapes: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query parameter the page builder reads the prompt from
pub const PROMPT_PARAMETER: &str = "business_description";

/// Builds the page-builder address carrying the whole prompt
pub fn delivery_url(base_url: &str, prompt: &str) -> String {
    format!(
        "{}?{}={}",
        base_url,
        PROMPT_PARAMETER,
        utf8_percent_encode(prompt, URI_COMPONENT)
    )
}
