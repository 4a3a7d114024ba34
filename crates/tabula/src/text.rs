//! Small string helpers shared by columns and filters.

/// Turn a field name into a human label: `first_name` becomes `First Name`.
pub fn headline(field: &str) -> String {
    field
        .split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Last path segment of a Rust type name, e.g. `app::tables::Users` -> `Users`.
pub fn basename(type_name: &str) -> &str {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}
