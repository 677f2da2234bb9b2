//! Standalone HTML shopping list page

use chrono::NaiveDate;
use larder_common::html::escape;
use larder_common::time::format_date;
use larder_common::{ShoppingItem, ShoppingKind};

fn list_items(items: &[&ShoppingItem], empty: &str) -> String {
    if items.is_empty() {
        return format!("            <li>{}</li>\n", empty);
    }
    items
        .iter()
        .map(|item| {
            let details = if item.details.is_empty() {
                String::new()
            } else {
                format!(" ({})", escape(&item.details))
            };
            format!(
                "            <li class=\"priority-{}\">{}{} - {}</li>\n",
                item.priority,
                escape(&item.name),
                details,
                escape(&item.reason)
            )
        })
        .collect()
}

/// Render the shopping list as a complete HTML document
pub fn shopping_page(list: &[ShoppingItem], today: NaiveDate) -> String {
    let restock: Vec<&ShoppingItem> = list
        .iter()
        .filter(|i| i.kind == ShoppingKind::Restock)
        .collect();
    let standard: Vec<&ShoppingItem> = list
        .iter()
        .filter(|i| i.kind == ShoppingKind::Standard)
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Larder - Shopping List</title>
</head>
<body>
    <header>
        <h1>Shopping List</h1>
        <p>Generated {date}</p>
    </header>
    <div class="container">
        <div class="shopping-list">
            <h2>Items to restock (low quantity or expiring soon)</h2>
            <ul>
{restock}            </ul>
        </div>
        <div class="shopping-list">
            <h2>Standard items</h2>
            <ul>
{standard}            </ul>
        </div>
    </div>
</body>
</html>
"#,
        date = format_date(today),
        restock = list_items(&restock, "No items need restocking"),
        standard = list_items(&standard, "No standard items needed"),
    )
}
