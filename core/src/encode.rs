//! Percent-encoding helpers shared by the builder and the router facade.

use crate::{ParameterValue, Params};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
const PATH_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encode one value for use inside a URL path (space becomes `%20`).
pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, PATH_COMPONENT).to_string()
}

/// Decode percent escapes; invalid UTF-8 is replaced, `+` stays literal.
pub(crate) fn decode_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Serialize parameters as an `application/x-www-form-urlencoded` query.
///
/// Arrays become `name[0]=a&name[1]=b`, pairs become `name[key]=value`.
pub(crate) fn build_query(params: &Params) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        match value {
            ParameterValue::Scalar(v) => {
                serializer.append_pair(name, v);
            }
            ParameterValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    serializer.append_pair(&format!("{name}[{i}]"), item);
                }
            }
            ParameterValue::Pairs(pairs) => {
                for (k, v) in pairs {
                    serializer.append_pair(&format!("{name}[{k}]"), v);
                }
            }
            ParameterValue::Missing => {}
        }
    }
    serializer.finish()
}
