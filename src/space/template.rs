//! Template types and variable expansion.
//!
//! A template pairs a URL pattern containing `$name` placeholders with an
//! ordered set of variable specifications. Expansion substitutes every
//! combination of variable values into the pattern, producing the template's
//! full URL set in a fixed, reproducible order.

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

fn default_step() -> i64 {
    1
}

fn default_kind() -> String {
    "templated".to_string()
}

/// Specification for a single template variable.
///
/// The variant is selected by the `type` field of the descriptor document.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VariableSpec {
    /// A fixed, ordered list of values.
    Options {
        /// Values substituted in declaration order.
        values: Vec<String>,
    },

    /// An inclusive integer range with a positive step.
    Increment {
        /// First value of the range.
        start: i64,
        /// Last value of the range (inclusive).
        end: i64,
        /// Step between values; defaults to 1.
        #[serde(default = "default_step")]
        step: i64,
    },

    /// An inclusive day-by-day date range rendered through a format string.
    ///
    /// The format uses `YYYY`, `MM`, and `DD` tokens; anything else is
    /// emitted literally.
    Date {
        /// First date of the range.
        start: NaiveDate,
        /// Last date of the range (inclusive).
        end: NaiveDate,
        /// Output format, e.g. `"YYYY-MM-DD"` or `"YYYY/MM"`.
        format: String,
    },
}

impl VariableSpec {
    /// Expands this variable into its ordered value list.
    ///
    /// An inverted range (`start > end`) expands to nothing; the template
    /// then produces no URLs, which is how a descriptor retires a variable
    /// axis without deleting it.
    #[must_use]
    pub fn expand(&self) -> Vec<String> {
        match self {
            Self::Options { values } => values.clone(),
            Self::Increment { start, end, step } => {
                let mut out = Vec::new();
                let step = (*step).max(1);
                let mut value = *start;
                while value <= *end {
                    out.push(value.to_string());
                    value += step;
                }
                out
            }
            Self::Date { start, end, format } => {
                let pattern = translate_date_format(format);
                let mut out = Vec::new();
                let mut day = *start;
                while day <= *end {
                    out.push(day.format(&pattern).to_string());
                    match day.succ_opt() {
                        Some(next) => day = next,
                        None => break,
                    }
                }
                out
            }
        }
    }

    /// Returns the declared step for increment variables, 1 otherwise.
    #[must_use]
    pub fn step(&self) -> i64 {
        match self {
            Self::Increment { step, .. } => *step,
            _ => 1,
        }
    }
}

/// Translates `YYYY`/`MM`/`DD` tokens into chrono format specifiers.
fn translate_date_format(format: &str) -> String {
    format
        .replace("YYYY", "%Y")
        .replace("MM", "%m")
        .replace("DD", "%d")
}

/// A named URL template with ordered placeholder variables.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlTemplate {
    /// Unique template name; used for filtering and grouping.
    pub name: String,

    /// URL pattern with `$name` placeholder tokens.
    #[serde(rename = "url")]
    pub pattern: String,

    /// Template kind tag from the document; only `"templated"` is valid.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    /// Placeholder variables in declaration order.
    #[serde(
        rename = "template_vars",
        default,
        deserialize_with = "deserialize_ordered_vars"
    )]
    pub variables: Vec<(String, VariableSpec)>,

    /// Optional CSS selector handed to the item extractor for pages from
    /// this template. Collaborator configuration, not crawl semantics.
    #[serde(default)]
    pub item_selector: Option<String>,
}

impl UrlTemplate {
    /// Expands this template into its full ordered URL set.
    ///
    /// Variables vary per standard product iteration: the last declared
    /// placeholder varies fastest. Expansion is pure; calling it twice
    /// yields identical lists.
    #[must_use]
    pub fn expand(&self) -> Vec<String> {
        let axes: Vec<Vec<String>> = self.variables.iter().map(|(_, spec)| spec.expand()).collect();
        if axes.iter().any(Vec::is_empty) {
            return Vec::new();
        }

        // Substitute longer names first so `$page` is never clobbered by `$p`.
        let mut order: Vec<usize> = (0..self.variables.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.variables[i].0.len()));

        let mut urls = Vec::new();
        let mut indices = vec![0usize; axes.len()];
        loop {
            let mut url = self.pattern.clone();
            for &i in &order {
                let token = format!("${}", self.variables[i].0);
                url = url.replace(&token, &axes[i][indices[i]]);
            }
            urls.push(url);

            // Odometer increment, last axis fastest.
            let mut axis = axes.len();
            loop {
                if axis == 0 {
                    return urls;
                }
                axis -= 1;
                indices[axis] += 1;
                if indices[axis] < axes[axis].len() {
                    break;
                }
                indices[axis] = 0;
            }
        }
    }
}

/// Deserializes `template_vars` preserving document declaration order.
///
/// A plain `HashMap` would lose the order that drives expansion, so the map
/// entries are collected into a `Vec` as they stream by.
fn deserialize_ordered_vars<'de, D>(
    deserializer: D,
) -> Result<Vec<(String, VariableSpec)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVars;

    impl<'de> Visitor<'de> for OrderedVars {
        type Value = Vec<(String, VariableSpec)>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a map of variable names to variable specs")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::new();
            while let Some((name, spec)) = map.next_entry::<String, VariableSpec>()? {
                entries.push((name, spec));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVars)
}
