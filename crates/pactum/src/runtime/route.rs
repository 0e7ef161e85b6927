use pactum_schema::types::Method;

///
/// Route
///
/// One REST route of a generated controller. `path` may hold `:param`
/// segments.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub operation: &'static str,
}

impl Route {
    /// Whether a concrete request path matches this route.
    #[must_use]
    pub fn matches(&self, method: Method, path: &str) -> bool {
        method == self.method && self.params(path).is_some()
    }

    /// `:param` values captured from a concrete path, in order.
    #[must_use]
    pub fn params<'p>(&self, path: &'p str) -> Option<Vec<(&'static str, &'p str)>> {
        let mut pattern = self.path.split('/').filter(|s| !s.is_empty());
        let mut actual = path.split('/').filter(|s| !s.is_empty());
        let mut params = Vec::new();

        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return Some(params),
                (Some(p), Some(a)) => match p.strip_prefix(':') {
                    Some(name) => params.push((name, a)),
                    None if p == a => {}
                    None => return None,
                },
                _ => return None,
            }
        }
    }

    /// The route in `routes` serving `method` and `path`.
    #[must_use]
    pub fn find<'r>(routes: &'r [Self], method: Method, path: &str) -> Option<&'r Self> {
        routes.iter().find(|r| r.matches(method, path))
    }

    /// Like [`Self::find`], also returning the captured params. A literal
    /// segment wins over a `:param` in the same position.
    #[must_use]
    pub fn resolve<'r, 'p>(
        routes: &'r [Self],
        method: Method,
        path: &'p str,
    ) -> Option<(&'r Self, Vec<(&'static str, &'p str)>)> {
        routes
            .iter()
            .filter(|r| r.method == method)
            .filter_map(|r| r.params(path).map(|params| (r, params)))
            .min_by_key(|(_, params)| params.len())
    }
}
