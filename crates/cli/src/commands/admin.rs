//! Admin commands.
//!
//! Every command first visits `/admin`; the route guard decides whether the
//! session may continue.

use secrecy::SecretString;
use stoneart_admin::AdminClient;
use stoneart_admin::client::DASHBOARD_PATH;
use stoneart_admin::dashboard::{AdminProductPager, Dashboard};
use stoneart_admin::forms::{
    CategoryForm, ImageUpload, PasswordChangeForm, ProductFields, ProductForm, ProductUpdateForm,
    RegisterAdminForm,
};
use stoneart_storefront::catalog::PageOutcome;
use stoneart_storefront::state::Storefront;

use super::CliError;
use crate::{AdminAction, ProductFieldArgs, ProductFieldOverrides, render};

pub async fn run(storefront: &Storefront, action: AdminAction) -> Result<(), CliError> {
    if storefront.session().visit(DASHBOARD_PATH) != DASHBOARD_PATH {
        return Err(CliError::NotAdmin);
    }
    let client = AdminClient::from_storefront(storefront);
    let currency = storefront.config().currency;

    match action {
        AdminAction::Stats => {
            let dashboard = Dashboard::load(&client).await?;
            render::json(&serde_json::Value::Object(dashboard.stats));
        }
        AdminAction::Products { pages } => {
            let first = client
                .products(None, stoneart_admin::dashboard::ADMIN_PAGE_SIZE)
                .await?;
            let mut pager = AdminProductPager::new(client, first);
            for _ in 1..pages {
                if pager.load_more().await? == PageOutcome::Exhausted {
                    break;
                }
            }
            render::products(pager.products(), currency);
        }
        AdminAction::Product { id } => {
            let product = client.product(id).await?;
            render::product(&product, currency);
        }
        AdminAction::CreateProduct { fields, images } => {
            let form = ProductForm {
                fields: product_fields(fields),
                images: read_images(&client, &images)?,
            };
            client.create_product(form).await?;
        }
        AdminAction::UpdateProduct {
            id,
            fields,
            drop_images,
            images,
        } => {
            let current = client.product(id).await?;
            let existing_image_urls = current
                .image_urls
                .as_slice()
                .iter()
                .filter(|url| !drop_images.contains(url))
                .cloned()
                .collect();
            let form = ProductUpdateForm {
                fields: apply_overrides(fields, current),
                existing_image_urls,
                images: read_images(&client, &images)?,
            };
            client.update_product(id, form).await?;
        }
        AdminAction::CreateCategory { name } => {
            client.create_category(CategoryForm { name }).await?;
        }
        AdminAction::Register {
            name,
            email,
            password,
        } => {
            let form = RegisterAdminForm {
                name,
                email,
                password: SecretString::from(password),
            };
            client.register_admin(form).await?;
        }
        AdminAction::ResetPassword {
            current,
            new_password,
            confirm,
        } => {
            let form = PasswordChangeForm {
                current_password: SecretString::from(current),
                new_password: SecretString::from(new_password),
                confirm_password: SecretString::from(confirm),
            };
            client.reset_password(form).await?;
        }
    }
    Ok(())
}

fn product_fields(args: ProductFieldArgs) -> ProductFields {
    ProductFields {
        name: args.name,
        description: args.description,
        price: args.price,
        category_id: args.category,
        status: args.status,
    }
}

fn apply_overrides(
    overrides: ProductFieldOverrides,
    current: stoneart_storefront::api::Product,
) -> ProductFields {
    ProductFields {
        name: overrides.name.unwrap_or(current.name),
        description: overrides.description.unwrap_or(current.description),
        price: overrides.price.unwrap_or(current.price),
        category_id: overrides.category.unwrap_or(current.category_id),
        status: overrides.status.unwrap_or(current.status),
    }
}

/// Read image files, surfacing a rejected file as a notice.
fn read_images(
    client: &AdminClient,
    paths: &[std::path::PathBuf],
) -> Result<Vec<ImageUpload>, CliError> {
    paths
        .iter()
        .map(|path| {
            ImageUpload::from_path(path).inspect_err(|err| {
                if let Some(notice) = err.notice() {
                    client.notifier().notify(notice);
                }
            })
        })
        .collect::<Result<_, _>>()
        .map_err(CliError::from)
}
