use crate::store::Record;
use serde_json::Value;

/// Casing rule applied to a column's textual cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Title-cased, e.g. "jane doe" -> "Jane Doe".
    Name,
    /// Lower-cased, e.g. "SP-01" -> "sp-01".
    Id,
}

/// Declared column roles for one dataset. Columns are matched case-insensitively after
/// trimming; a column listed under both roles is treated as a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRoles {
    pub name_fields: Vec<String>,
    pub id_fields: Vec<String>,
}

impl FieldRoles {
    pub fn new<N, I>(name_fields: N, id_fields: I) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name_fields: name_fields.into_iter().map(Into::into).collect(),
            id_fields: id_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn role_of(&self, column: &str) -> Option<FieldRole> {
        let column = column.trim();
        let matches = |declared: &String| declared.trim().eq_ignore_ascii_case(column);

        if self.name_fields.iter().any(matches) {
            Some(FieldRole::Name)
        } else if self.id_fields.iter().any(matches) {
            Some(FieldRole::Id)
        } else {
            None
        }
    }
}

/// Trims every textual cell and applies the declared casing rules. Non-string cells
/// pass through unchanged.
pub fn normalize_record(record: Record, roles: &FieldRoles) -> Record {
    record
        .into_iter()
        .map(|(column, value)| {
            let value = match value {
                Value::String(text) => Value::String(normalize_text(&text, roles.role_of(&column))),
                other => other,
            };
            (column, value)
        })
        .collect()
}

fn normalize_text(text: &str, role: Option<FieldRole>) -> String {
    let trimmed = text.trim();
    match role {
        Some(FieldRole::Name) => title_case(trimmed),
        Some(FieldRole::Id) => trimmed.to_lowercase(),
        None => trimmed.to_string(),
    }
}

/// Upper-cases the first letter of every run of letters and lower-cases the rest, so
/// "o'NEIL-smith" becomes "O'Neil-Smith".
pub fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut inside_word = false;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if inside_word {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            inside_word = true;
        } else {
            output.push(ch);
            inside_word = false;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn internship_roles() -> FieldRoles {
        FieldRoles::new(
            ["Name", "Project Name", "Mentor Name"],
            ["Email Id", "Internship Id"],
        )
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("jane doe"), "Jane Doe");
        assert_eq!(title_case("MARY-ANN o'neil"), "Mary-Ann O'Neil");
        assert_eq!(title_case("mars rover  v2"), "Mars Rover  V2");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn role_matching_is_declared_not_inferred() {
        let roles = internship_roles();
        assert_eq!(roles.role_of(" project name "), Some(FieldRole::Name));
        assert_eq!(roles.role_of("INTERNSHIP ID"), Some(FieldRole::Id));
        assert_eq!(roles.role_of("Identity"), None);
        assert_eq!(roles.role_of("Username"), None);

        let overlapping = FieldRoles::new(["Code"], ["Code"]);
        assert_eq!(overlapping.role_of("code"), Some(FieldRole::Name));
    }

    #[test]
    fn normalize_record_applies_roles_and_trims() {
        let record = json!({
            "Name": "  jane DOE \n",
            "Email Id": " Jane.Doe@Example.COM ",
            "Internship Id": "SP-INT-07",
            "Project Name": "satellite imagery",
            "Mentor Email": " Mentor@Example.com ",
            "Duration": 6,
            "certificate": null,
        })
        .as_object()
        .cloned()
        .expect("object");

        let normalized = normalize_record(record, &internship_roles());
        assert_eq!(normalized["Name"], json!("Jane Doe"));
        assert_eq!(normalized["Email Id"], json!("jane.doe@example.com"));
        assert_eq!(normalized["Internship Id"], json!("sp-int-07"));
        assert_eq!(normalized["Project Name"], json!("Satellite Imagery"));
        assert_eq!(normalized["Mentor Email"], json!("Mentor@Example.com"));
        assert_eq!(normalized["Duration"], json!(6));
        assert_eq!(normalized["certificate"], Value::Null);
    }
}
