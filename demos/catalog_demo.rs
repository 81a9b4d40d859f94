//! Walkthrough of listings, toggles, cart lines and ratings on the in-memory store

use anyhow::Result;
use catalog::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🛒 Catalog Demo\n");

    let config = CatalogConfig::default_config().from_env_overrides()?;
    // One store per collection
    let products = CatalogService::new(
        Arc::new(InMemoryRecordStore::new()),
        config.collection("products").cloned().unwrap_or_else(CollectionConfig::products),
        config.paging,
    );
    let blogs = CatalogService::new(
        Arc::new(InMemoryRecordStore::new()),
        config.collection("blogs").cloned().unwrap_or_else(CollectionConfig::blogs),
        config.paging,
    );
    let users = CatalogService::new(
        Arc::new(InMemoryRecordStore::new()),
        CollectionConfig::new("users"),
        config.paging,
    );

    // Seed
    let catalogue = [
        ("iPhone 15", 999, "Apple", "Black"),
        ("iPhone 15 Mini", 799, "Apple", "Red"),
        ("Galaxy S24", 899, "Samsung", "Blue"),
        ("Pixel 8", 699, "Google", "Black"),
        ("Phone Case", 29, "Generic", "Red"),
    ];
    let mut product_ids = Vec::new();
    for (title, price, brand, color) in catalogue {
        let product = products
            .insert(
                Record::new(Uuid::new_v4())
                    .with("title", title)
                    .with("price", price)
                    .with("brand", brand)
                    .with("color", color)
                    .with("ratings", json!([]))
                    .with("totalRatings", 0.0),
            )
            .await?;
        product_ids.push(product.id);
    }
    let blog = blogs
        .insert(Record::new(Uuid::new_v4()).with("title", "Why we love phones"))
        .await?;
    let alice = users
        .insert(Record::new(Uuid::new_v4()).with("name", "Alice"))
        .await?;
    let bob = Uuid::new_v4();

    println!("📋 Listing: price[gte]=700&sort=-price&fields=title,price&limit=2\n");
    let query = QueryParams::from_query_string("price[gte]=700&sort=-price&fields=title,price&limit=2");
    let page = products.list(&query).await?;
    println!("{}\n", serde_json::to_string_pretty(&page)?);

    println!("🔎 Listing: title=iphone\n");
    let page = products.list(&QueryParams::from_query_string("title=iphone")).await?;
    for item in &page.items {
        println!("   - {}", item.get("title").and_then(Value::as_str).unwrap_or("?"));
    }
    println!();

    println!("👍 Toggles on blog {}\n", blog.id);
    blogs.toggle(blog.id, alice.id, ToggleSide::B).await?;
    println!("   Alice dislikes: {:?}", blogs.membership(blog.id, alice.id).await?);
    blogs.toggle(blog.id, alice.id, ToggleSide::A).await?;
    println!("   Alice likes (first call clears): {:?}", blogs.membership(blog.id, alice.id).await?);
    blogs.toggle(blog.id, alice.id, ToggleSide::A).await?;
    println!("   Alice likes (second call): {:?}\n", blogs.membership(blog.id, alice.id).await?);

    println!("🧺 Cart for Alice\n");
    users.update_cart(alice.id, CartLine::new(product_ids[0], "Black", 1)).await?;
    users.update_cart(alice.id, CartLine::new(product_ids[0], "Black", 2)).await?;
    let alice = users.update_cart(alice.id, CartLine::new(product_ids[0], "Red", 1)).await?;
    println!("{}\n", serde_json::to_string_pretty(&alice.get("cart"))?);

    println!("⭐ Ratings for {}\n", product_ids[2]);
    products.rate(product_ids[2], RatingInput::new(alice.id, 5).with_comment("great")).await?;
    products.rate(product_ids[2], RatingInput::new(bob, 3)).await?;
    let rated = products.rate(product_ids[2], RatingInput::new(bob, 4)).await?;
    println!(
        "   totalRatings = {}\n",
        rated.get("totalRatings").cloned().unwrap_or(Value::Null)
    );

    println!("✅ Done");
    Ok(())
}
