//! Desktop browser User-Agent strings rotated across listing requests

use rand::seq::IndexedRandom;

/// Browser families represented in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

/// Desktop operating systems represented in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Mac,
}

const CHROME_WINDOWS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
];

const CHROME_LINUX: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
];

const CHROME_MAC: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
];

const FIREFOX_WINDOWS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
];

const FIREFOX_LINUX: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const FIREFOX_MAC: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const SAFARI_MAC: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Safari/605.1.15",
];

const EDGE_WINDOWS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0",
];

const EDGE_MAC: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

const ALL_POOLS: &[&[&str]] = &[
    CHROME_WINDOWS,
    CHROME_LINUX,
    CHROME_MAC,
    FIREFOX_WINDOWS,
    FIREFOX_LINUX,
    FIREFOX_MAC,
    SAFARI_MAC,
    EDGE_WINDOWS,
    EDGE_MAC,
];

/// Pick a User-Agent for the given browser and platform.
///
/// Combinations that do not exist (Safari on Windows, Edge on Linux) fall
/// back to Chrome on the same platform.
pub fn user_agent_for(browser: Browser, platform: Platform) -> &'static str {
    let pool = match (browser, platform) {
        (Browser::Chrome, Platform::Windows) => CHROME_WINDOWS,
        (Browser::Chrome, Platform::Linux) => CHROME_LINUX,
        (Browser::Chrome, Platform::Mac) => CHROME_MAC,
        (Browser::Firefox, Platform::Windows) => FIREFOX_WINDOWS,
        (Browser::Firefox, Platform::Linux) => FIREFOX_LINUX,
        (Browser::Firefox, Platform::Mac) => FIREFOX_MAC,
        (Browser::Safari, Platform::Mac) => SAFARI_MAC,
        (Browser::Edge, Platform::Windows) => EDGE_WINDOWS,
        (Browser::Edge, Platform::Mac) => EDGE_MAC,
        (Browser::Safari, Platform::Windows) | (Browser::Edge, Platform::Linux) => {
            return user_agent_for(Browser::Chrome, platform);
        }
        (Browser::Safari, Platform::Linux) => CHROME_LINUX,
    };

    choose(pool)
}

/// Any User-Agent from the whole pool; called once per request.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    let pool = ALL_POOLS.choose(&mut rng).copied().unwrap_or(CHROME_WINDOWS);
    choose(pool)
}

fn choose(pool: &'static [&'static str]) -> &'static str {
    pool.choose(&mut rand::rng())
        .copied()
        .unwrap_or(CHROME_WINDOWS[0])
}
