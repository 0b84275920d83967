//! Catalog queries: products, variants, issues and store locations

use crate::models::{Issue, Product, ProductRow, StoreLocation, Variant};
use crate::workflow::CatalogSource;
use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

/// Postgres-backed catalog
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn products(&self) -> Result<Vec<Product>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, image_url, description FROM products ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await?;

        // One query for all variants instead of one per product
        let variants = sqlx::query_as::<_, Variant>(
            "SELECT id, product_id, name FROM product_variants ORDER BY product_id, sort_order, name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<String, Vec<Variant>> = HashMap::new();
        for variant in variants {
            by_product
                .entry(variant.product_id.clone())
                .or_default()
                .push(variant);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let variants = by_product.remove(&row.id).unwrap_or_default();
                Product::from_row(row, variants)
            })
            .collect())
    }

    pub async fn product(&self, product_id: &str) -> Result<Option<Product>, sqlx::Error> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, image_url, description FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let variants = self.variants(&row.id).await?;
                Ok(Some(Product::from_row(row, variants)))
            }
            None => Ok(None),
        }
    }

    pub async fn variants(&self, product_id: &str) -> Result<Vec<Variant>, sqlx::Error> {
        sqlx::query_as::<_, Variant>(
            "SELECT id, product_id, name FROM product_variants WHERE product_id = $1 ORDER BY sort_order, name",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn issues(&self) -> Result<Vec<Issue>, sqlx::Error> {
        sqlx::query_as::<_, Issue>("SELECT id, name FROM issues ORDER BY sort_order, name")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn locations(&self) -> Result<Vec<StoreLocation>, sqlx::Error> {
        sqlx::query_as::<_, StoreLocation>(
            "SELECT id, name FROM store_locations ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl CatalogSource for PgCatalog {
    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        self.products().await.context("listing products")
    }

    async fn list_variants(&self, product_id: &str) -> anyhow::Result<Vec<Variant>> {
        self.variants(product_id)
            .await
            .with_context(|| format!("listing variants of {}", product_id))
    }

    async fn list_issues(&self) -> anyhow::Result<Vec<Issue>> {
        self.issues().await.context("listing issues")
    }
}
