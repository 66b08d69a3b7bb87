// ABOUTME: Records manual-entry requests for barcodes that could not be resolved
// ABOUTME: Bumps the attempt count of a pending request or opens a new one

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{ProductRequest, RequestStatus, Requester};

/// Record that `requester` failed to resolve `barcode`
///
/// An existing pending request for the barcode gets its attempt count bumped,
/// otherwise a new pending request is opened. Failures are logged and
/// swallowed so the lookup response is never affected.
pub async fn record_request(
    database: &Database,
    barcode: &str,
    requester: &Requester,
) -> Option<ProductRequest> {
    match record_request_inner(database, barcode, requester).await {
        Ok(request) => Some(request),
        Err(e) => {
            warn!(barcode = %barcode, "Failed to record product request: {e}");
            None
        }
    }
}

async fn record_request_inner(
    database: &Database,
    barcode: &str,
    requester: &Requester,
) -> AppResult<ProductRequest> {
    let now = Utc::now();

    if let Some(mut existing) = database.find_pending_product_request(barcode).await? {
        database
            .bump_product_request_attempt(existing.id, now)
            .await?;
        existing.attempt_count += 1;
        existing.last_attempt_date = now;
        info!(
            barcode = %barcode,
            request_id = %existing.id,
            attempts = existing.attempt_count,
            "Bumped pending product request"
        );
        return Ok(existing);
    }

    let request = ProductRequest {
        id: Uuid::new_v4(),
        barcode: barcode.to_owned(),
        requested_by: requester.user_id,
        requested_by_name: requester.name.clone(),
        requested_by_email: requester.email.clone(),
        status: RequestStatus::Pending,
        attempt_count: 1,
        last_attempt_date: now,
        admin_notes: None,
        created_at: now,
        resolved_at: None,
        resolved_by: None,
    };
    database.create_product_request(&request).await?;
    info!(
        barcode = %barcode,
        request_id = %request.id,
        requested_by = %request.requested_by_name,
        "Opened product request"
    );
    Ok(request)
}
