//! Frontend URLs the provider redirects back to.

/// Redirect targets for hosted checkout and the billing portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingUrls {
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
}

impl BillingUrls {
    /// Derives all redirect targets from the frontend base URL.
    pub fn from_base(app_base_url: &str) -> Self {
        let base = app_base_url.trim_end_matches('/');
        Self {
            success_url: format!("{}/premium?checkout=success&session_id={{CHECKOUT_SESSION_ID}}", base),
            cancel_url: format!("{}/premium?checkout=canceled", base),
            portal_return_url: format!("{}/premium", base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_urls_without_double_slash() {
        let urls = BillingUrls::from_base("https://app.example.com/");

        assert_eq!(
            urls.success_url,
            "https://app.example.com/premium?checkout=success&session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.cancel_url, "https://app.example.com/premium?checkout=canceled");
        assert_eq!(urls.portal_return_url, "https://app.example.com/premium");
    }
}
