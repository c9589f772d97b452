//! Route pages resolved lazily, the way a bundler would fetch a split chunk.
//!
//! [`PageProvider::resolve`] waits out a configurable delay before handing
//! back a [`Page`], which is enough to make races between route switches
//! visible in the UI.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Navigable routes, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Home,
    Products,
    Contact,
    /// Has no page behind it; resolving it always fails.
    Missing,
}

impl Route {
    pub const ALL: &[Route] = &[Route::Home, Route::Products, Route::Contact, Route::Missing];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Products => "/products",
            Route::Contact => "/contact",
            Route::Missing => "/missing",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Products => "Products",
            Route::Contact => "Contact",
            Route::Missing => "Missing",
        }
    }

    /// Exact path match; a trailing slash is tolerated.
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let normalised = match trimmed.trim_end_matches('/') {
            "" if trimmed.starts_with('/') => "/",
            p => p,
        };
        Self::ALL.iter().copied().find(|r| r.path() == normalised)
    }

    /// Next route in tab order, wrapping around.
    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A resolved page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("no page registered for {0}")]
    NotFound(String),
}

struct Product {
    title: &'static str,
    price: u32,
}

const PRODUCTS: &[Product] = &[
    Product { title: "Mechanical keyboard", price: 120 },
    Product { title: "Trackball", price: 65 },
    Product { title: "USB-C dock", price: 89 },
    Product { title: "Monitor arm", price: 45 },
];

/// Hands out pages after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct PageProvider {
    pub delay: Duration,
}

impl PageProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn resolve(self, route: Route) -> Result<Page, PageError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::trace!(%route, "page chunk fetched");
        build_page(route)
    }
}

fn build_page(route: Route) -> Result<Page, PageError> {
    let page = match route {
        Route::Home => Page {
            title: "Home".into(),
            body: vec![
                "Welcome!".into(),
                String::new(),
                "Switch routes quickly: only the page you land on is shown,".into(),
                "no matter which chunk finishes fetching first.".into(),
            ],
        },
        Route::Products => Page {
            title: "Products".into(),
            body: PRODUCTS
                .iter()
                .map(|p| format!("{:<24} ${:>4}", p.title, p.price))
                .collect(),
        },
        Route::Contact => Page {
            title: "Contact".into(),
            body: vec!["Write to us at hello@example.com".into()],
        },
        Route::Missing => return Err(PageError::NotFound(route.path().to_string())),
    };
    Ok(page)
}
