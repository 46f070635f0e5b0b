//! Base message templates - the listing/contact block shared by all
//! lead notifications.

use crate::store::{Lead, SiteSettings};

/// Placeholder for fields the lead or settings record doesn't carry.
const MISSING: &str = "N/A";

/// Render the base lead/listing block of a notification.
///
/// Pure; missing fields render as placeholders rather than failing.
pub fn lead_notification_base(lead: &Lead, settings: &SiteSettings) -> String {
    let price = lead
        .property_price
        .map(format_price)
        .unwrap_or_else(|| MISSING.to_string());

    format!(
        "*NEW LEAD — {site}*\n\
         👤 {name}\n\
         📧 {email}\n\
         📱 {phone}\n\
         💬 \"{message}\"\n\n\
         🏠 {title} ({ptype})\n\
         💰 {price}",
        site = settings.site_name.as_deref().unwrap_or(MISSING),
        name = lead.name,
        email = lead.email.as_deref().unwrap_or(MISSING),
        phone = lead.phone.as_deref().unwrap_or(MISSING),
        message = lead.message,
        title = lead.property_title.as_deref().unwrap_or(MISSING),
        ptype = lead.property_type.as_deref().unwrap_or(MISSING),
    )
}

/// Thousands-separated price string, e.g. `R$ 500,000.00`.
fn format_price(price: f64) -> String {
    let whole = price.trunc() as i64;
    let cents = ((price - price.trunc()) * 100.0).round() as i64;

    let mut grouped = String::new();
    let digits = whole.abs().to_string();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if whole < 0 { "-" } else { "" };
    format!("R$ {sign}{grouped}.{cents:02}")
}
