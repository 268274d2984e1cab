//! 通知文案模板
//!
//! 推送与 Telegram 消息的文本格式，面向印尼语用户

use std::collections::BTreeMap;
use std::fmt::Write;

use uuid::Uuid;

use super::types::{OrderPlacedNotice, PushMessage, StatusChangedNotice};
use crate::models::PaymentType;

const DEFAULT_FIRST_NAME: &str = "Pelanggan";
const UNKNOWN_CUSTOMER: &str = "Pelanggan Tidak Dikenal";
const SEPARATOR: &str = "──────────────────\n";
const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
const ORDER_CHANNEL: &str = "order_channel";
const STATUS_CHANNEL: &str = "status_channel";

/// 取全名的第一个词并转为首字母大写
pub fn first_name(fullname: Option<&str>) -> String {
    let Some(word) = fullname.and_then(|name| name.split_whitespace().next()) else {
        return DEFAULT_FIRST_NAME.to_string();
    };

    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => DEFAULT_FIRST_NAME.to_string(),
    }
}

/// 以点号分隔千位，如 1250000 → "1.250.000"
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        formatted.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(ch);
    }
    formatted
}

fn push_message(
    token: &str,
    title: String,
    body: String,
    kind: &str,
    order_code: &str,
    channel_id: &str,
) -> PushMessage {
    let tag = Uuid::new_v4().to_string();
    let data = BTreeMap::from([
        ("title".to_string(), title.clone()),
        ("body".to_string(), body.clone()),
        ("type".to_string(), kind.to_string()),
        ("orderId".to_string(), order_code.to_string()),
        ("uuid".to_string(), tag.clone()),
        ("click_action".to_string(), CLICK_ACTION.to_string()),
    ]);

    PushMessage {
        token: token.to_string(),
        title,
        body,
        channel_id: channel_id.to_string(),
        tag,
        data,
    }
}

/// 新订单推送，用户没有 token 时返回 `None`
pub fn order_placed_push(notice: &OrderPlacedNotice) -> Option<PushMessage> {
    let token = notice.customer.fcm_token.as_deref().filter(|t| !t.is_empty())?;
    let name = first_name(notice.customer.fullname.as_deref());
    let order = &notice.order;

    let (title, body) = match order.payment_type {
        PaymentType::Cod => (
            format!("Hai {name}, Pesanan COD Berhasil 🎉"),
            format!(
                "Terima kasih telah berbelanja! Pesanan #{} senilai Rp {} sudah kami terima.",
                order.order_code,
                format_rupiah(order.grand_total)
            ),
        ),
        PaymentType::Points => (
            format!("Hai {name}, Pesanan POIN Berhasil 🎉"),
            format!(
                "Terima kasih telah berbelanja! Pesanan #{} senilai {} Poin sudah kami terima.",
                order.order_code, order.grand_total
            ),
        ),
    };

    Some(push_message(
        token,
        title,
        body,
        "new_order",
        &order.order_code,
        ORDER_CHANNEL,
    ))
}

/// 状态变更推送，用户没有 token 时返回 `None`
pub fn status_changed_push(notice: &StatusChangedNotice) -> Option<PushMessage> {
    let token = notice.fcm_token.as_deref().filter(|t| !t.is_empty())?;
    let title = format!("Status Pesanan #{} Diperbarui", notice.order_code);
    let body = format!(
        "Pesanan Anda sekarang dalam status: {}",
        notice.status.display_name()
    );

    Some(push_message(
        token,
        title,
        body,
        "status_update",
        &notice.order_code,
        STATUS_CHANNEL,
    ))
}

/// 运营群新订单消息（Telegram HTML）
pub fn telegram_order_message(notice: &OrderPlacedNotice, admin_order_url: &str) -> String {
    let order = &notice.order;
    let amount = |value: i64| match order.payment_type {
        PaymentType::Cod => format!("Rp {}", format_rupiah(value)),
        PaymentType::Points => format!("Poin {}", format_rupiah(value)),
    };

    let mut text = String::new();
    // String 的 fmt::Write 不会失败
    let _ = writeln!(text, "🛒 <b>ORDER BARUU #{}</b>", order.order_code);
    text.push_str(SEPARATOR);

    text.push_str("<b>Pelanggan:</b>\n");
    match notice.customer.fullname.as_deref() {
        Some(fullname) => {
            let phone = notice.customer.phone_number.as_deref().unwrap_or_default();
            let _ = writeln!(text, "├ {fullname}");
            let _ = writeln!(text, "╰ {phone}");
        }
        None => {
            let _ = writeln!(text, "├ {UNKNOWN_CUSTOMER}");
            text.push_str("╰ -\n");
        }
    }
    text.push_str(SEPARATOR);

    let _ = writeln!(text, "<b>Produk ({} item):</b>", notice.items.len());
    for (i, item) in notice.items.iter().enumerate() {
        let prefix = if i + 1 == notice.items.len() { "╰" } else { "├" };
        let _ = writeln!(text, "{prefix} {}", item.product_name);
        let _ = writeln!(
            text,
            "│   ╰ {}x ({} {}) • {}",
            item.quantity,
            item.weight,
            item.unit,
            amount(item.line_total)
        );
    }
    text.push_str(SEPARATOR);

    let subtotal: i64 = notice.items.iter().map(|item| item.line_total).sum();
    text.push_str("<b>Rincian Harga:</b>\n");
    let _ = writeln!(text, "├ Subtotal\t: {}", amount(subtotal));
    let _ = writeln!(text, "├ Ongkos Kirim\t: {}", amount(order.shipping_cost));
    let _ = writeln!(text, "╰ <b>TOTAL\t: {}</b>", amount(order.grand_total));
    text.push_str(SEPARATOR);

    let _ = writeln!(text, "<b>Metode Pembayaran:</b> {}", order.payment_method);
    text.push_str(SEPARATOR);

    let _ = write!(
        text,
        "📝 <a href=\"{}/{}\">LIHAT DETAIL PESANAN</a>",
        admin_order_url.trim_end_matches('/'),
        order.id
    );

    text
}
