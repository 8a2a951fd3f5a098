//! Cart repository.

use sqlx::{PgConnection, PgPool};

use shopx_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{CartLine, CheckoutLine, InactiveShopItem};

/// An existing cart line, without product details.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Repository for carts and their lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the user's cart ID, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let id: CartId = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Cart lines joined with product and shop state, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id, ci.product_id, p.name AS product_name, p.image_url, p.price,
                   ci.quantity, p.stock_quantity AS available_stock,
                   p.is_active AS product_is_active,
                   p.seller_id, s.shop_name, s.is_active AS shop_is_active, ci.added_at
            FROM shop.cart_item ci
            JOIN shop.product p ON p.id = ci.product_id
            JOIN shop.seller s ON s.id = p.seller_id
            WHERE ci.cart_id = $1
            ORDER BY ci.added_at DESC, ci.id DESC
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRecord>(
            r"
            SELECT id, cart_id, product_id, quantity
            FROM shop.cart_item
            WHERE cart_id = $1 AND product_id = $2
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Find a line that belongs to the given user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_user(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRecord>(
            r"
            SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity
            FROM shop.cart_item ci
            JOIN shop.cart c ON c.id = ci.cart_id
            WHERE c.user_id = $1 AND ci.id = $2
            ",
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a line, or add to its quantity if the product is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        let id: CartItemId = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart_item (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = shop.cart_item.quantity + EXCLUDED.quantity
            RETURNING id
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn set_quantity(&self, item_id: CartItemId, quantity: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.cart_item SET quantity = $2 WHERE id = $1")
            .bind(item_id)
            .bind(quantity)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn remove(&self, item_id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE id = $1")
            .bind(item_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line from a cart. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Selected lines whose shop is deactivated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inactive_shops(
        &self,
        user_id: UserId,
        item_ids: &[CartItemId],
    ) -> Result<Vec<InactiveShopItem>, RepositoryError> {
        let ids: Vec<i32> = item_ids.iter().map(CartItemId::as_i32).collect();
        let rows = sqlx::query_as::<_, InactiveShopItem>(
            r"
            SELECT ci.id AS cart_item_id, p.name AS product_name, s.id AS seller_id, s.shop_name
            FROM shop.cart_item ci
            JOIN shop.cart c ON c.id = ci.cart_id
            JOIN shop.product p ON p.id = ci.product_id
            JOIN shop.seller s ON s.id = p.seller_id
            WHERE c.user_id = $1 AND ci.id = ANY($2) AND NOT s.is_active
            ORDER BY ci.id
            ",
        )
        .bind(user_id)
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// Load the selected lines of a user's cart for checkout.
///
/// Lines that are not in this user's cart are silently absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn checkout_lines(
    conn: &mut PgConnection,
    user_id: UserId,
    item_ids: &[CartItemId],
) -> Result<Vec<CheckoutLine>, RepositoryError> {
    let ids: Vec<i32> = item_ids.iter().map(CartItemId::as_i32).collect();
    let rows = sqlx::query_as::<_, CheckoutLine>(
        r"
        SELECT ci.id AS cart_item_id, ci.product_id, p.seller_id, ci.quantity
        FROM shop.cart_item ci
        JOIN shop.cart c ON c.id = ci.cart_id
        JOIN shop.product p ON p.id = ci.product_id
        WHERE c.user_id = $1 AND ci.id = ANY($2)
        ORDER BY ci.id
        FOR UPDATE OF ci
        ",
    )
    .bind(user_id)
    .bind(&ids)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Delete the given cart lines.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_lines(
    conn: &mut PgConnection,
    item_ids: &[CartItemId],
) -> Result<u64, RepositoryError> {
    let ids: Vec<i32> = item_ids.iter().map(CartItemId::as_i32).collect();
    let result = sqlx::query("DELETE FROM shop.cart_item WHERE id = ANY($1)")
        .bind(&ids)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
