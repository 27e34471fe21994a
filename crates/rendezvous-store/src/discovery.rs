//! Discovery — keyset pagination over the registration table.
//!
//! A page is "live rows with seq greater than the cookie's counter", so rows
//! inserted or deleted between pages never cause duplicates or gaps: every
//! new registration gets a seq above everything already handed out.

use rendezvous_core::cookie;
use rendezvous_core::registration::Seq;
use rendezvous_core::{Nonce, Registration};

use crate::error::StoreError;
use crate::table::RegistrationTable;

/// One page of discovery results.
#[derive(Debug, Clone)]
pub struct DiscoverPage {
    /// Registrations in ascending sequence order.
    pub registrations: Vec<Registration>,
    /// Cookie to pass back for the next page.
    ///
    /// Always present. When the page is empty it points at the same position
    /// as the request, so polling with it picks up later registrations.
    pub cookie: Vec<u8>,
}

/// Resolve a caller-supplied cookie to its watermark.
///
/// An absent or empty cookie starts from the beginning. Anything else must
/// decode and must carry a tag for this namespace and nonce.
pub(crate) fn watermark(
    cookie: Option<&[u8]>,
    namespace: &str,
    nonce: &Nonce,
) -> Result<Seq, StoreError> {
    match cookie {
        None => Ok(0),
        Some(c) if c.is_empty() => Ok(0),
        Some(c) => {
            let counter = cookie::unpack(c)?;
            if !cookie::valid(c, namespace, nonce) {
                return Err(StoreError::InvalidCookie);
            }
            Ok(counter)
        }
    }
}

pub(crate) fn discover(
    table: &RegistrationTable,
    nonce: &Nonce,
    namespace: &str,
    cookie: Option<&[u8]>,
    limit: u64,
    now: i64,
) -> Result<DiscoverPage, StoreError> {
    let after = watermark(cookie, namespace, nonce)?;

    let rows = table.page_after(namespace, after, now, limit)?;
    let last = rows.last().map(|r| r.seq).unwrap_or(after);

    Ok(DiscoverPage {
        registrations: rows.into_iter().map(|r| r.registration).collect(),
        cookie: cookie::pack(last, namespace, nonce),
    })
}
