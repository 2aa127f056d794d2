/// Deterministic identifier mangling for emitted validator names.
///
/// Relation and function names become camelCase identifiers; relations in
/// the primary emission schema are unprefixed, every other schema prefixes
/// its own camelCase name. Identifiers that would start with a digit get an
/// underscore prefix.

/// Suffix for each emitted bundle kind.
pub const LIST_SUFFIX: &str = "ListSchema";
pub const INSERT_SUFFIX: &str = "InsertSchema";
pub const INSERT_LENIENT_SUFFIX: &str = "InsertLenientSchema";
pub const UPDATE_SUFFIX: &str = "UpdateSchema";
pub const RELATIONSHIPS_SUFFIX: &str = "Relationships";
pub const ARGS_SUFFIX: &str = "ArgsSchema";
pub const RETURNS_SUFFIX: &str = "ReturnsSchema";

/// Identifier for one bundle of the given relation or function.
pub fn bundle_ident(primary_schema: &str, schema: &str, name: &str, suffix: &str) -> String {
    let base = if schema == primary_schema {
        camel_case(name)
    } else {
        let mut prefixed = camel_case(schema);
        prefixed.push_str(&pascal_case(name));
        prefixed
    };
    let mut ident = guard_leading_digit(base);
    ident.push_str(suffix);
    ident
}

fn guard_leading_digit(ident: String) -> String {
    match ident.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("_{ident}"),
        _ => ident,
    }
}

/// Lower-camel-case over words split at non-alphanumeric boundaries.
pub fn camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (index, word) in words(input).iter().enumerate() {
        if index == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Upper-camel-case over the same word split.
pub fn pascal_case(input: &str) -> String {
    words(input).iter().map(|word| capitalize(word)).collect()
}

fn words(input: &str) -> Vec<String> {
    input
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_string())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}
