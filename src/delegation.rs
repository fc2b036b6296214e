//! Delegation links: time-limited, column-scoped edit grants for external,
//! unauthenticated parties.
//!
//! A link is an opaque random secret that resolves server-side to one
//! (sheet, row) pair. Validity is `now < expires_at` and the row still
//! existing; a successful submission stamps `used_at` but does not retire
//! the link, so an external party can revisit and resubmit until expiry.
//!
//! The editable column set is read from the sheet schema at redemption
//! time, not issuance time: un-flagging a column immediately revokes it on
//! every outstanding link.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::text::canonicalize_date_value;
use crate::types::{ColumnDef, ColumnKind, DelegationToken, Row, RowData};

pub const DEFAULT_TTL_DAYS: i64 = 10;

const TOKEN_BYTES: usize = 32;

/// Audit identity recorded on rows written through a redeemed link.
const DELEGATED_ACTOR: &str = "external";

/// Generates an opaque URL-safe token from a cryptographically secure
/// random source.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// What a redeemed link exposes: the full row for display plus the subset
/// of columns the external party may edit.
#[derive(Debug)]
pub struct Redemption {
    pub row: Row,
    pub editable: Vec<ColumnDef>,
    pub expires_at: DateTime<Utc>,
}

/// Mints a link for one row. The row must exist and belong to the sheet.
pub fn issue(
    store: &dyn Store,
    sheet: &str,
    row_id: i64,
    issuer: &str,
    ttl: Duration,
) -> Result<DelegationToken> {
    if ttl <= Duration::zero() {
        return Err(Error::Validation("link ttl must be positive".to_string()));
    }

    let row = store.get_row(row_id)?.ok_or(Error::NotFound)?;
    if row.sheet != sheet {
        return Err(Error::NotFound);
    }

    let now = Utc::now();
    let token = DelegationToken {
        token: generate_token(),
        sheet: sheet.to_string(),
        row_id,
        expires_at: now + ttl,
        issued_by: issuer.to_string(),
        created_at: now,
        used_at: None,
    };
    store.create_delegation(&token)?;
    Ok(token)
}

/// Looks up and validates a token. Every failure mode collapses into
/// `LinkInvalid` so callers cannot distinguish an unknown token from an
/// expired one or a deleted row; the cause is only logged.
fn resolve(store: &dyn Store, token: &str, now: DateTime<Utc>) -> Result<(DelegationToken, Row)> {
    let Some(delegation) = store.get_delegation(token)? else {
        tracing::debug!("delegation lookup failed: unknown token");
        return Err(Error::LinkInvalid);
    };

    if delegation.is_expired(now) {
        tracing::debug!(
            row_id = delegation.row_id,
            expired_at = %delegation.expires_at,
            "delegation lookup failed: token expired"
        );
        return Err(Error::LinkInvalid);
    }

    let Some(row) = store.get_row(delegation.row_id)? else {
        tracing::debug!(
            row_id = delegation.row_id,
            "delegation lookup failed: row no longer exists"
        );
        return Err(Error::LinkInvalid);
    };

    Ok((delegation, row))
}

/// Redeems a link for display: the row's full data plus the columns
/// currently marked delegatable.
pub fn redeem_for_read(store: &dyn Store, token: &str, now: DateTime<Utc>) -> Result<Redemption> {
    let (delegation, row) = resolve(store, token, now)?;
    let sheet = store.get_sheet(&delegation.sheet)?.ok_or_else(|| {
        tracing::debug!(sheet = %delegation.sheet, "delegation lookup failed: sheet missing");
        Error::LinkInvalid
    })?;

    Ok(Redemption {
        row,
        editable: sheet.delegatable_columns(),
        expires_at: delegation.expires_at,
    })
}

/// Redeems a link for writing. Only fields inside the current delegatable
/// set are applied; anything else in the submission is dropped silently —
/// the submitter still sees a uniform success. Date-typed values are
/// canonicalized before storage. Stamps `used_at` on success.
pub fn redeem_for_write(
    store: &dyn Store,
    token: &str,
    submitted: &RowData,
    now: DateTime<Utc>,
) -> Result<()> {
    let (delegation, row) = resolve(store, token, now)?;
    let sheet = store.get_sheet(&delegation.sheet)?.ok_or_else(|| {
        tracing::debug!(sheet = %delegation.sheet, "delegation lookup failed: sheet missing");
        Error::LinkInvalid
    })?;

    let editable = sheet.delegatable_columns();
    let allowed: Vec<String> = editable.iter().map(|c| c.name.clone()).collect();

    let mut fields = RowData::new();
    for column in &editable {
        if let Some(value) = submitted.get(&column.name) {
            let value = value.trim();
            let value = if column.kind == ColumnKind::Date {
                canonicalize_date_value(value)
            } else {
                value.to_string()
            };
            fields.insert(column.name.clone(), value);
        }
    }

    let dropped = submitted.len() - fields.len();
    if dropped > 0 {
        tracing::debug!(
            row_id = row.id,
            dropped,
            "delegated submission contained out-of-scope fields"
        );
    }

    store.merge_row_fields(row.id, &fields, &allowed, DELEGATED_ACTOR)?;
    store.mark_delegation_used(token)?;
    Ok(())
}

/// Stamps `used_at` without writing any fields (the "I'm done" action on
/// the fill-in page).
pub fn finish(store: &dyn Store, token: &str, now: DateTime<Utc>) -> Result<()> {
    let (delegation, _) = resolve(store, token, now)?;
    store.mark_delegation_used(&delegation.token)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_long_enough() {
        let token = generate_token();
        assert_eq!(token.len(), 43); // 32 bytes, base64url, no padding
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
