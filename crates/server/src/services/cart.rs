//! Cart service.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use shopx_core::pricing::line_total;
use shopx_core::{CartItemId, UserId};

use super::{ServiceError, ServiceResult};
use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::models::cart::{AddCartItem, Cart, CartLine, CartSummary, InactiveShopItem};

/// Quantity and price totals over a set of lines.
#[must_use]
pub fn totals(lines: &[CartLine]) -> CartSummary {
    CartSummary {
        line_count: i64::try_from(lines.len()).unwrap_or(i64::MAX),
        total_quantity: lines.iter().map(|l| i64::from(l.quantity)).sum(),
        total_price: lines
            .iter()
            .map(|l| line_total(l.price, l.quantity))
            .sum::<Decimal>(),
    }
}

/// Cart operations for one user at a time.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// The user's cart with lines, created on first access.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> ServiceResult<Cart> {
        let cart_id = self.cart_id(user_id).await?;
        let items = self.carts.lines(cart_id).await?;
        let summary = totals(&items);
        Ok(Cart {
            id: cart_id,
            items,
            total_quantity: summary.total_quantity,
            total_price: summary.total_price,
        })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    pub async fn summary(&self, user_id: UserId) -> ServiceResult<CartSummary> {
        let cart_id = self.cart_id(user_id).await?;
        let lines = self.carts.lines(cart_id).await?;
        Ok(totals(&lines))
    }

    /// Add a product, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for a non-positive quantity,
    /// `ServiceError::NotFound` for an unknown or inactive product, and
    /// `ServiceError::InvalidOperation` when stock doesn't cover the new total.
    #[instrument(skip(self), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add_item(&self, user_id: UserId, item: &AddCartItem) -> ServiceResult<Cart> {
        if item.quantity <= 0 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be greater than zero".to_owned(),
            ));
        }

        let cart_id = self.cart_id(user_id).await?;
        let product = self
            .products
            .get(item.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::not_found("product", item.product_id))?;

        let existing = self
            .carts
            .find_by_product(cart_id, item.product_id)
            .await?
            .map_or(0, |line| line.quantity);

        let wanted = existing.saturating_add(item.quantity);
        if wanted > product.stock_quantity {
            return Err(ServiceError::InvalidOperation(format!(
                "only {} of '{}' in stock ({} already in your cart)",
                product.stock_quantity, product.name, existing
            )));
        }

        self.carts.upsert(cart_id, item.product_id, item.quantity).await?;
        self.get(user_id).await
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the line isn't in the user's cart,
    /// and `ServiceError::InvalidOperation` when stock is insufficient.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> ServiceResult<Cart> {
        let line = self
            .carts
            .find_for_user(user_id, item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cart item", item_id))?;

        if quantity <= 0 {
            self.carts.remove(line.id).await?;
            return self.get(user_id).await;
        }

        let product = self
            .products
            .get(line.product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", line.product_id))?;
        if quantity > product.stock_quantity {
            return Err(ServiceError::InvalidOperation(format!(
                "only {} of '{}' in stock",
                product.stock_quantity, product.name
            )));
        }

        self.carts.set_quantity(line.id, quantity).await?;
        self.get(user_id).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the line isn't in the user's cart.
    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> ServiceResult<Cart> {
        let line = self
            .carts
            .find_for_user(user_id, item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cart item", item_id))?;
        self.carts.remove(line.id).await?;
        self.get(user_id).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> ServiceResult<Cart> {
        let cart_id = self.cart_id(user_id).await?;
        let removed = self.carts.clear(cart_id).await?;
        tracing::debug!(removed, "Cleared cart");
        self.get(user_id).await
    }

    /// Selected lines whose shop has been deactivated.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn inactive_shops(
        &self,
        user_id: UserId,
        item_ids: &[CartItemId],
    ) -> ServiceResult<Vec<InactiveShopItem>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.carts.inactive_shops(user_id, item_ids).await?)
    }

    async fn cart_id(&self, user_id: UserId) -> ServiceResult<shopx_core::CartId> {
        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(ServiceError::not_found("user", user_id));
        }
        Ok(self.carts.get_or_create(user_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopx_core::{ProductId, SellerId};

    fn line(id: i32, price: &str, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            image_url: None,
            price: price.parse().unwrap(),
            quantity,
            available_stock: 100,
            product_is_active: true,
            seller_id: SellerId::new(1),
            shop_name: "Shop".to_owned(),
            shop_is_active: true,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals() {
        let summary = totals(&[line(1, "19.99", 2), line(2, "5.00", 3)]);
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.total_quantity, 5);
        assert_eq!(summary.total_price, "54.98".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_totals_empty() {
        let summary = totals(&[]);
        assert_eq!(summary.line_count, 0);
        assert_eq!(summary.total_quantity, 0);
        assert_eq!(summary.total_price, Decimal::ZERO);
    }
}
