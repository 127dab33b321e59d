use crate::models::PromptInput;

pub const BAND_TEXT: &str = include_str!("../data/prompts/band_text.txt");
pub const BAND_PHOTO: &str = include_str!("../data/prompts/band_photo.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass over the template: placeholder-like text
/// inside a substituted value is left as-is. Unknown placeholders are kept
/// verbatim.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        match after_open.find("}}") {
            Some(end) => {
                let key = &after_open[..end];
                match vars.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(key);
                        result.push_str("}}");
                    }
                }
                rest = &after_open[end + 2..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Instruction for the text model. User fields are embedded verbatim.
pub fn band_text(input: &PromptInput) -> String {
    let year = input.year.to_string();
    render(
        BAND_TEXT,
        &[
            ("name", input.name.as_str()),
            ("band", input.band.as_str()),
            ("year", year.as_str()),
        ],
    )
}

/// Instruction for the image model. User fields are embedded verbatim.
pub fn band_photo(input: &PromptInput) -> String {
    let year = input.year.to_string();
    render(
        BAND_PHOTO,
        &[
            ("name", input.name.as_str()),
            ("band", input.band.as_str()),
            ("year", year.as_str()),
        ],
    )
}
