/// User input as the host delivers it, already split into search terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw: String,
    pub action_keyword: Option<String>,
    pub terms: Vec<String>,
}

impl Query {
    /// Splits `raw` on whitespace. A leading term equal to `action_keyword`
    /// selects the plugin and is not part of the search.
    pub fn new(raw: &str, action_keyword: Option<&str>) -> Self {
        let mut terms: Vec<String> = raw.split_whitespace().map(str::to_string).collect();

        let action_keyword = match action_keyword {
            Some(keyword) if terms.first().is_some_and(|t| t == keyword) => {
                terms.remove(0);
                Some(keyword.to_string())
            }
            _ => None,
        };

        Self {
            raw: raw.to_string(),
            action_keyword,
            terms,
        }
    }

    /// All search terms joined with single spaces.
    pub fn search(&self) -> String {
        self.terms.join(" ")
    }

    pub fn first_search(&self) -> &str {
        self.terms.first().map(String::as_str).unwrap_or_default()
    }

    pub fn second_to_end_search(&self) -> String {
        self.terms.iter().skip(1).map(String::as_str).collect::<Vec<_>>().join(" ")
    }

    pub fn is_blank(&self) -> bool {
        self.terms.is_empty()
    }
}
