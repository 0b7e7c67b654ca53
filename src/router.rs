//! Hash-style route parsing.
//!
//! Only two views exist: the archive (`#/`) and a single issue
//! (`#/issue/<id>`). Anything unrecognised goes to the archive.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Issue(String),
}

impl Route {
    /// Parse a location hash such as `#/issue/2025-08-18_2025-08-24`.
    pub fn parse(hash: &str) -> Self {
        let Some(path) = hash.trim().strip_prefix('#') else {
            return Self::Home;
        };

        match path.strip_prefix("/issue/") {
            Some(id) if !id.is_empty() && !id.contains('/') => Self::Issue(id.to_string()),
            _ => Self::Home,
        }
    }

    /// Parse CLI input: a hash route, a `/issue/<id>` path, or a bare issue
    /// id.
    pub fn from_arg(arg: &str) -> Self {
        let arg = arg.trim();
        if arg.is_empty() || arg.starts_with('#') {
            return Self::parse(arg);
        }
        let id = arg.strip_prefix("/issue/").unwrap_or(arg);
        Self::parse(&format!("#/issue/{id}"))
    }

    pub fn to_hash(&self) -> String {
        match self {
            Self::Home => "#/".to_string(),
            Self::Issue(id) => format!("#/issue/{id}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_routes() {
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("#/"), Route::Home);
        assert_eq!(Route::parse("#"), Route::Home);
    }

    #[test]
    fn test_issue_route() {
        assert_eq!(
            Route::parse("#/issue/2025-08-18_2025-08-24"),
            Route::Issue("2025-08-18_2025-08-24".to_string())
        );
    }

    #[test]
    fn test_other_shapes_fall_back_home() {
        for hash in [
            "#/issue/",
            "#/issue",
            "#/about",
            "#/issue/a/b",
            "issue/x",
            "/issue/x",
            "#//issue/x",
        ] {
            assert_eq!(Route::parse(hash), Route::Home, "{hash}");
        }
    }

    #[test]
    fn test_from_arg_accepts_bare_id() {
        assert_eq!(
            Route::from_arg("2025-08-18_2025-08-24"),
            Route::Issue("2025-08-18_2025-08-24".to_string())
        );
        assert_eq!(
            Route::from_arg("/issue/2025-08-18_2025-08-24"),
            Route::Issue("2025-08-18_2025-08-24".to_string())
        );
        assert_eq!(Route::from_arg("/about"), Route::Home);
        assert_eq!(Route::from_arg("#/"), Route::Home);
        assert_eq!(Route::from_arg(""), Route::Home);
    }

    #[test]
    fn test_to_hash_round_trip() {
        let route = Route::Issue("2025-08-18_2025-08-24".to_string());
        assert_eq!(Route::parse(&route.to_hash()), route);
        assert_eq!(Route::Home.to_string(), "#/");
    }
}
