//! Dashboard plus the add and take forms

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use larder_common::model::format_quantity;
use larder_common::overview::InventoryOverview;
use larder_common::pantry::ConsumeOutcome;
use larder_common::shopping::{derive_shopping_list, preview};
use larder_common::{time, Error, Ingredient, NewIngredient, ShoppingItem};
use serde::Deserialize;

use super::{render, with_pantry};
use crate::pages::escape;
use crate::services::DelegateError;
use crate::session::{CurrentUser, FlashLevel, SessionId};
use crate::{ApiError, ApiResult, AppState};

/// Shopping entries shown on the dashboard
pub const SHOPPING_PREVIEW_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub expires_in: String,
}

#[derive(Debug, Deserialize)]
pub struct TakeForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
}

pub(crate) fn inventory_table(inventory: &[Ingredient]) -> String {
    if inventory.is_empty() {
        return r#"<p class="empty">The larder is empty.</p>"#.to_string();
    }
    let today = time::today();
    let rows: String = inventory
        .iter()
        .map(|item| {
            let days = item.days_remaining(today);
            let class = if days < 0 {
                "expired"
            } else if item.is_low_quantity() {
                "low"
            } else {
                ""
            };
            format!(
                r#"<tr class="{class}"><td>{name}</td><td>{quantity}</td><td>{unit}</td><td>{added}</td><td>{expiry}</td><td>{days}</td></tr>
"#,
                name = escape(&item.name),
                quantity = format_quantity(item.quantity),
                unit = escape(&item.unit),
                added = time::format_date(item.added_date),
                expiry = time::format_date(item.expiry_date()),
            )
        })
        .collect();
    format!(
        r#"<table>
<thead><tr><th>Name</th><th>Quantity</th><th>Unit</th><th>Added</th><th>Expires</th><th>Days left</th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    )
}

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, escape(empty));
    }
    let entries: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape(i)))
        .collect();
    format!("<ul>{}</ul>", entries)
}

fn shopping_preview(list: &[ShoppingItem]) -> String {
    let (shown, more) = preview(list, SHOPPING_PREVIEW_LIMIT);
    if shown.is_empty() {
        return r#"<p class="empty">Nothing to buy.</p>"#.to_string();
    }
    let mut html: String = shown
        .iter()
        .map(|i| {
            format!(
                r#"<li class="priority-{}">{} <small>{}</small></li>"#,
                i.priority,
                escape(&i.name),
                escape(&i.reason)
            )
        })
        .collect();
    html = format!("<ul>{}</ul>", html);
    if more > 0 {
        html.push_str(&format!(
            r#"<p><a href="/shoppinglist">{} more items...</a></p>"#,
            more
        ));
    }
    html
}

fn standard_list(standard: &[Ingredient]) -> String {
    if standard.is_empty() {
        return r#"<p class="empty">No standard items yet.</p>"#.to_string();
    }
    let entries: String = standard
        .iter()
        .map(|s| {
            format!(
                r#"<li>{} <a class="remove" href="/remove_singredient/{}">remove</a></li>"#,
                escape(&s.name),
                urlencoding::encode(&s.name)
            )
        })
        .collect();
    format!("<ul>{}</ul>", entries)
}

/// GET /home
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let (inventory, standard) =
        with_pantry(&state, |p| Ok((p.inventory()?, p.standard_items()?))).await?;
    let today = time::today();
    let overview = InventoryOverview::from_inventory(&inventory, today);
    let shopping = derive_shopping_list(&inventory, &standard, today);

    let expired: Vec<String> = overview.expired.iter().map(|n| n.describe()).collect();
    let nearly: Vec<String> = overview
        .nearly_expired
        .iter()
        .map(|n| n.describe())
        .collect();
    let low: Vec<String> = overview
        .low_quantity
        .iter()
        .map(|i| format!("{} ({})", i.name, i.amount()))
        .collect();

    let body = format!(
        r#"<h2>Welcome, {user}</h2>
<section class="alerts">
    <div class="card"><h3>Expired</h3>{expired}</div>
    <div class="card"><h3>Expiring soon</h3>{nearly}</div>
    <div class="card"><h3>Low quantity</h3>{low}</div>
</section>
<section class="card"><h3>Inventory</h3>{inventory}</section>
<section class="card"><h3>Shopping list</h3>{shopping}</section>
<section class="card"><h3>Standard items</h3>{standard}</section>"#,
        user = escape(&user),
        expired = bullet_list(&expired, "Nothing has expired."),
        nearly = bullet_list(&nearly, "Nothing expires in the next days."),
        low = bullet_list(&low, "Nothing is running low."),
        inventory = inventory_table(&inventory),
        shopping = shopping_preview(&shopping),
        standard = standard_list(&standard),
    );
    Ok(render(&state, &session, Some(&user), "Home", &body)
        .await
        .into_response())
}

/// GET /add
pub async fn add_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let body = r#"<h2>Add ingredient</h2>
<form method="post" action="/add" class="card">
    <label>Name <input type="text" name="name" required></label>
    <label>Quantity <input type="number" name="quantity" step="any" min="0" required></label>
    <label>Unit <input type="text" name="unit" placeholder="kg, l, pcs"></label>
    <label>Expires in (days) <input type="number" name="expires_in" step="1" required></label>
    <button type="submit">Add</button>
</form>"#;
    render(&state, &session, Some(&user), "Add ingredient", body)
        .await
        .into_response()
}

fn parse_add_form(form: &AddForm) -> Result<NewIngredient, String> {
    let quantity: f64 = form
        .quantity
        .trim()
        .parse()
        .map_err(|_| format!("Invalid quantity: {}", form.quantity.trim()))?;
    let expires_in: i64 = form
        .expires_in
        .trim()
        .parse()
        .map_err(|_| format!("Invalid expiry days: {}", form.expires_in.trim()))?;
    NewIngredient::new(&form.name, quantity, &form.unit, expires_in).map_err(|e| e.to_string())
}

/// POST /add
pub async fn add_ingredient(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<AddForm>,
) -> Redirect {
    let (level, message) = match parse_add_form(&form) {
        Err(message) => (FlashLevel::Error, message),
        Ok(item) => match state.add_delegate.submit_add(&item).await {
            Ok(()) => (
                FlashLevel::Success,
                format!(
                    "Added {} {} of {} (expires in {} days)",
                    format_quantity(item.quantity),
                    item.unit,
                    item.name,
                    item.expires_in
                ),
            ),
            Err(DelegateError::NotFound(_)) => {
                (FlashLevel::Error, "Executable not found.".to_string())
            }
            Err(e @ (DelegateError::Failed(_) | DelegateError::Duplicate(_))) => (
                FlashLevel::Error,
                format!("Failed to add ingredient: {}", e),
            ),
            Err(e) => (FlashLevel::Error, format!("Error: {}", e)),
        },
    };

    state.sessions.flash(&session, level, message).await;
    Redirect::to("/add")
}

/// GET /taking
pub async fn taking_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let inventory = with_pantry(&state, |p| p.inventory()).await?;
    let options: String = inventory
        .iter()
        .map(|i| format!(r#"<option value="{0}">{0}</option>"#, escape(&i.name)))
        .collect();

    let body = format!(
        r#"<h2>Take ingredient</h2>
<form method="post" action="/taking" class="card">
    <label>Name <input type="text" name="name" list="stocked" required></label>
    <datalist id="stocked">{options}</datalist>
    <label>Quantity <input type="number" name="quantity" step="any" min="0" value="1"></label>
    <button type="submit">Take</button>
</form>
<section class="card"><h3>In stock</h3>{table}</section>"#,
        table = inventory_table(&inventory),
    );
    Ok(render(&state, &session, Some(&user), "Take ingredient", &body)
        .await
        .into_response())
}

fn parse_take_quantity(raw: Option<&str>) -> Result<f64, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1.0),
        Some(text) => text
            .parse()
            .map_err(|_| format!("Invalid quantity: {}", text)),
    }
}

/// POST /taking
pub async fn take_ingredient(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<TakeForm>,
) -> ApiResult<Redirect> {
    let name = form.name.trim().to_string();
    let (level, message) = match parse_take_quantity(form.quantity.as_deref()) {
        Err(message) => (FlashLevel::Error, message),
        Ok(quantity) => {
            let target = name.clone();
            match with_pantry(&state, move |p| p.consume(&target, quantity)).await {
                Ok(ConsumeOutcome::Removed(item)) => (
                    FlashLevel::Success,
                    format!(
                        "Removed all {} {} of {}",
                        format_quantity(item.quantity),
                        item.unit,
                        item.name
                    ),
                ),
                Ok(ConsumeOutcome::Decremented { taken, remaining }) => (
                    FlashLevel::Success,
                    format!(
                        "Took {} {} of {} (remaining: {})",
                        format_quantity(taken),
                        remaining.unit,
                        remaining.name,
                        format_quantity(remaining.quantity)
                    ),
                ),
                Ok(ConsumeOutcome::NotFound) => {
                    (FlashLevel::Error, format!("Ingredient {} not found", name))
                }
                Err(ApiError::Common(Error::InvalidInput(message))) => {
                    (FlashLevel::Error, message)
                }
                Err(e) => return Err(e),
            }
        }
    };

    state.sessions.flash(&session, level, message).await;
    Ok(Redirect::to("/taking"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, quantity: &str, unit: &str, expires_in: &str) -> AddForm {
        AddForm {
            name: name.to_string(),
            quantity: quantity.to_string(),
            unit: unit.to_string(),
            expires_in: expires_in.to_string(),
        }
    }

    #[test]
    fn test_parse_add_form() {
        let item = parse_add_form(&form(" Rice ", "2", "kg", "300")).unwrap();
        assert_eq!(item.name, "Rice");
        assert_eq!(item.quantity, 2.0);

        assert_eq!(
            parse_add_form(&form("Rice", "lots", "kg", "300")).unwrap_err(),
            "Invalid quantity: lots"
        );
        assert!(parse_add_form(&form("Rice", "2", "kg", "soon")).is_err());
        assert!(parse_add_form(&form("", "2", "kg", "3")).is_err());
        assert!(parse_add_form(&form("Rice", "-1", "kg", "3")).is_err());
    }

    #[test]
    fn test_parse_add_form_rejects_out_of_range_expiry() {
        let message = parse_add_form(&form("Salt", "1", "kg", "99999999999")).unwrap_err();
        assert!(message.contains("Expiry days must be within"), "{}", message);
    }

    #[test]
    fn test_take_quantity_defaults_to_one() {
        assert_eq!(parse_take_quantity(None), Ok(1.0));
        assert_eq!(parse_take_quantity(Some("  ")), Ok(1.0));
        assert_eq!(parse_take_quantity(Some("0.25")), Ok(0.25));
        assert!(parse_take_quantity(Some("some")).is_err());
    }

    #[test]
    fn test_inventory_table_escapes_names() {
        let today = time::today();
        let html = inventory_table(&[Ingredient::new("<Jam>", 1.0, "jar", today, 30)]);
        assert!(html.contains("&lt;Jam&gt;"));
        assert!(!html.contains("<Jam>"));
    }
}
