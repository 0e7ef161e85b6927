use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

///
/// ErrorTree
///
/// Route-keyed collection of validation messages. Children are keyed by the
/// node that produced them (contract name, then field/service/index name),
/// so a rendered tree reads `Groups.roles: ...`.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
    children: BTreeMap<String, ErrorTree>,
}

impl ErrorTree {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, message: impl ToString) {
        self.messages.push(message.to_string());
    }

    /// Attach a child tree under `route`, merging with an existing child.
    pub fn add_child(&mut self, route: impl Into<String>, child: Self) {
        if child.is_empty() {
            return;
        }

        self.children.entry(route.into()).or_default().merge(child);
    }

    pub fn merge(&mut self, other: Self) {
        self.messages.extend(other.messages);
        for (route, child) in other.children {
            self.add_child(route, child);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.values().all(Self::is_empty)
    }

    #[must_use]
    pub fn child(&self, route: &str) -> Option<&Self> {
        self.children.get(route)
    }

    /// Top-level routes that carry at least one message.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.children
            .iter()
            .filter(|(_, child)| !child.is_empty())
            .map(|(route, _)| route.as_str())
    }

    /// Flatten into `(route, message)` pairs in deterministic order.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);

        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for message in &self.messages {
            out.push((prefix.to_string(), message.clone()));
        }

        for (route, child) in &self.children {
            let path = if prefix.is_empty() {
                route.clone()
            } else {
                format!("{prefix}.{route}")
            };
            child.flatten_into(&path, out);
        }
    }

    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .flatten()
            .into_iter()
            .map(|(route, message)| {
                if route.is_empty() {
                    message
                } else {
                    format!("{route}: {message}")
                }
            })
            .collect::<Vec<_>>();

        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for ErrorTree {}

/// Push a formatted message onto an `ErrorTree`.
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}
