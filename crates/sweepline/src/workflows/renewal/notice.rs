use std::fmt::Write as _;

use super::snapshot::{CustomerDigest, SingleCandidate};

/// Fixed subject used for every passport digest. The deduplication window
/// keys on this string together with the recipient, so it must not vary per
/// building or per run.
pub const DIGEST_SUBJECT: &str = "Upcoming chimney inspection renewals";

/// Subject for a single-inspection notice. Embeds the inspection address;
/// paired with the job id this is the deduplication key for single notices.
pub fn single_notice_subject(inspection_address: &str) -> String {
    format!("Inspection renewal notice - {inspection_address}")
}

/// Renders the body of a single-inspection renewal notice.
pub fn render_single_notice(candidate: &SingleCandidate, sender_contact: &str) -> String {
    let greeting = candidate
        .customer_name
        .as_deref()
        .map(|name| format!("Dear {name},"))
        .unwrap_or_else(|| "Dear customer,".to_string());
    let signature = candidate
        .technician_name
        .as_deref()
        .unwrap_or("Your chimney service team");

    let mut body = String::new();
    body.push_str("<div style=\"font-family: Arial, sans-serif; line-height: 1.6;\">\n");
    body.push_str("<h2>Chimney inspection renewal coming up</h2>\n");
    let _ = writeln!(body, "<p>{greeting}</p>");
    let _ = writeln!(
        body,
        "<p>The inspection of your flue is due for renewal in 14 days.</p>"
    );
    body.push_str("<ul>\n");
    let _ = writeln!(
        body,
        "<li><strong>Property:</strong> {}</li>",
        candidate.inspection_address
    );
    let _ = writeln!(
        body,
        "<li><strong>Last inspection:</strong> {}</li>",
        candidate.inspection_date
    );
    let _ = writeln!(
        body,
        "<li><strong>Valid until:</strong> {}</li>",
        candidate.deadline
    );
    body.push_str("</ul>\n");
    let _ = writeln!(
        body,
        "<p>Please book a new inspection before the deadline. Reach us at \
         <a href=\"mailto:{sender_contact}\">{sender_contact}</a>.</p>"
    );
    let _ = writeln!(body, "<p>Kind regards,<br><strong>{signature}</strong></p>");
    body.push_str("</div>\n");
    body
}

/// Renders the body of a per-customer passport digest: one section per
/// building, listing only the units that are due.
pub fn render_digest(digest: &CustomerDigest, sender_contact: &str) -> String {
    let greeting = digest
        .customer_name
        .as_deref()
        .map(|name| format!("Dear {name},"))
        .unwrap_or_else(|| "Dear customer,".to_string());

    let mut body = String::new();
    body.push_str("<div style=\"font-family: Arial, sans-serif; line-height: 1.6;\">\n");
    body.push_str("<h2>Chimney inspection renewals coming up</h2>\n");
    let _ = writeln!(body, "<p>{greeting}</p>");
    let _ = writeln!(
        body,
        "<p>The following units are due for re-inspection in 14 days:</p>"
    );

    for building in &digest.buildings {
        let _ = writeln!(body, "<h3>{}</h3>", building.address);
        body.push_str("<ul>\n");
        for unit in &building.units {
            let _ = writeln!(
                body,
                "<li>{} &mdash; valid until {}</li>",
                unit.unit_label, unit.deadline
            );
        }
        body.push_str("</ul>\n");
    }

    let _ = writeln!(
        body,
        "<p>Please book the renewals before the deadline. Reach us at \
         <a href=\"mailto:{sender_contact}\">{sender_contact}</a>.</p>"
    );
    body.push_str("<p>Kind regards,<br><strong>Your chimney service team</strong></p>\n");
    body.push_str("</div>\n");
    body
}
