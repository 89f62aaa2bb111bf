//! Response cookies
//!
//! Cookies are carried from the view to the response untouched and
//! serialised into `Set-Cookie` header values.

use std::fmt;

/// SameSite cookie policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SameSite {
    /// Strict same-site policy
    Strict,
    /// Lax same-site policy (recommended)
    #[default]
    Lax,
    /// No same-site restriction (requires Secure)
    None,
}

impl SameSite {
    /// Convert to cookie attribute string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// A cookie to set on the response
///
/// # Examples
///
/// ```rust
/// use acton_views::{Cookie, SameSite};
///
/// let cookie = Cookie::build("theme")
///     .value("dark")
///     .path("/")
///     .max_age_secs(3600)
///     .http_only(true)
///     .same_site(SameSite::Strict)
///     .build();
///
/// assert_eq!(
///     cookie.to_string(),
///     "theme=dark; Path=/; Max-Age=3600; SameSite=Strict; HttpOnly"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age_secs: Option<u64>,
    same_site: Option<SameSite>,
    http_only: bool,
    secure: bool,
}

impl Cookie {
    /// A cookie with only a name and value
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::build(name).value(value).build()
    }

    /// Start building a cookie with the given name and an empty value
    #[must_use]
    pub fn build(name: impl Into<String>) -> CookieBuilder {
        CookieBuilder {
            cookie: Self {
                name: name.into(),
                value: String::new(),
                path: None,
                domain: None,
                max_age_secs: None,
                same_site: None,
                http_only: false,
                secure: false,
            },
        }
    }

    /// Cookie name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Path attribute
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Domain attribute
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Max-Age attribute in seconds
    #[must_use]
    pub const fn max_age_secs(&self) -> Option<u64> {
        self.max_age_secs
    }

    /// SameSite attribute
    #[must_use]
    pub const fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    /// Whether the cookie is hidden from scripts
    #[must_use]
    pub const fn is_http_only(&self) -> bool {
        self.http_only
    }

    /// Whether the cookie is only sent over HTTPS
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(max_age) = self.max_age_secs {
            write!(f, "; Max-Age={max_age}")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={}", same_site.as_str())?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}

/// Builder for a [`Cookie`]
#[derive(Clone, Debug)]
#[must_use]
pub struct CookieBuilder {
    cookie: Cookie,
}

impl CookieBuilder {
    /// Set the value
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.cookie.value = value.into();
        self
    }

    /// Set the Path attribute
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.cookie.path = Some(path.into());
        self
    }

    /// Set the Domain attribute
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie.domain = Some(domain.into());
        self
    }

    /// Set the Max-Age attribute
    pub const fn max_age_secs(mut self, secs: u64) -> Self {
        self.cookie.max_age_secs = Some(secs);
        self
    }

    /// Set the SameSite attribute
    pub const fn same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = Some(same_site);
        self
    }

    /// Set the HttpOnly flag
    pub const fn http_only(mut self, http_only: bool) -> Self {
        self.cookie.http_only = http_only;
        self
    }

    /// Set the Secure flag
    pub const fn secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Cookie {
        self.cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_cookie() {
        assert_eq!(Cookie::new("cookie", "value2").to_string(), "cookie=value2");
    }

    #[test]
    fn test_all_attributes() {
        let cookie = Cookie::build("session")
            .value("abc")
            .path("/")
            .domain("example.com")
            .max_age_secs(86400)
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(true)
            .build();
        assert_eq!(
            cookie.to_string(),
            "session=abc; Path=/; Domain=example.com; Max-Age=86400; SameSite=Lax; HttpOnly; Secure"
        );
        assert!(cookie.is_secure());
        assert_eq!(cookie.domain(), Some("example.com"));
    }

    #[test]
    fn test_same_site_as_str() {
        assert_eq!(SameSite::Strict.as_str(), "Strict");
        assert_eq!(SameSite::Lax.as_str(), "Lax");
        assert_eq!(SameSite::None.as_str(), "None");
    }
}
