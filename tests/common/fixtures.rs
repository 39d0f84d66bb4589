//! Seed data for profiled stores.

use mongodb::bson::{Document, doc};

/// Orders where only every `pending_every`-th document is pending.
pub fn orders(count: usize, pending_every: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            doc! {
                "orderNo": i as i32,
                "status": if i % pending_every == 0 { "pending" } else { "shipped" },
                "total": (i * 10) as i32,
                "customer": {
                    "name": format!("Customer {}", i % 17),
                    "tier": if i % 5 == 0 { "gold" } else { "basic" },
                },
            }
        })
        .collect()
}
