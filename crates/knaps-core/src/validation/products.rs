use serde_json::Value;

use super::{FieldError, Fields};
use crate::products::{NewProduct, ProductPatch, ProductStatus};

/// Validate a create body. Missing optional fields take their defaults:
/// `product_availability` "In Stock", `status` Active, `online` true,
/// `pack_size` 1, `tax_exmt` and `stock_unmanaged` false.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_new_product(value: &Value) -> Result<NewProduct, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let product = NewProduct {
        distributor_name: f.required_string("distributor_name"),
        brand_name: f.required_string("brand_name"),
        product_code: f.required_string("product_code"),
        product_secondary_code: f.optional_string("product_secondary_code"),
        product_name: f.required_string("product_name"),
        description: f.optional_string("description"),
        summary: f.optional_string("summary"),
        shipping_class: f.optional_string("shipping_class"),
        category_name: f.required_string("category_name"),
        product_availability: f.string_or("product_availability", "In Stock"),
        status: f
            .patch_enum("status", ProductStatus::parse)
            .unwrap_or_default(),
        online: f.bool_or("online", true),
        superceded_by: f.optional_string("superceded_by"),
        ean: f.optional_string("ean"),
        pack_size: f.integer_at_least("pack_size", 1, 1),
        core_group: f.optional_string("core_group"),
        tax_exmt: f.bool_or("tax_exmt", false),
        hyperlink: f.optional_string("hyperlink"),
        web_title: f.optional_string("web_title"),
        features_and_benefits_codes: f.optional_string("features_and_benefits_codes"),
        badges_codes: f.optional_string("badges_codes"),
        stock_unmanaged: f.bool_or("stock_unmanaged", false),
        trade: f.required_decimal("trade"),
        rrp: f.required_decimal("rrp"),
        mwp: f.optional_decimal("mwp"),
        go: f.optional_decimal("go"),
    };
    f.finish(product)
}

/// Validate a partial update. Required columns may be omitted but not
/// nulled; nullable columns accept `null` to clear.
///
/// # Errors
///
/// Returns every field error found.
pub fn validate_product_patch(value: &Value) -> Result<ProductPatch, Vec<FieldError>> {
    let mut f = Fields::new(value)?;
    let patch = ProductPatch {
        distributor_name: f.patch_string("distributor_name"),
        brand_name: f.patch_string("brand_name"),
        product_code: f.patch_string("product_code"),
        product_secondary_code: f.patch_nullable_string("product_secondary_code"),
        product_name: f.patch_string("product_name"),
        description: f.patch_nullable_string("description"),
        summary: f.patch_nullable_string("summary"),
        shipping_class: f.patch_nullable_string("shipping_class"),
        category_name: f.patch_string("category_name"),
        product_availability: f.patch_string("product_availability"),
        status: f.patch_enum("status", ProductStatus::parse),
        online: f.patch_bool("online"),
        superceded_by: f.patch_nullable_string("superceded_by"),
        ean: f.patch_nullable_string("ean"),
        pack_size: f.patch_integer_at_least("pack_size", 1),
        core_group: f.patch_nullable_string("core_group"),
        tax_exmt: f.patch_bool("tax_exmt"),
        hyperlink: f.patch_nullable_string("hyperlink"),
        web_title: f.patch_nullable_string("web_title"),
        features_and_benefits_codes: f.patch_nullable_string("features_and_benefits_codes"),
        badges_codes: f.patch_nullable_string("badges_codes"),
        stock_unmanaged: f.patch_bool("stock_unmanaged"),
        trade: f.patch_decimal("trade"),
        rrp: f.patch_decimal("rrp"),
        mwp: f.patch_nullable_decimal("mwp"),
        go: f.patch_nullable_decimal("go"),
    };
    f.finish(patch)
}
