//! Sign-in, sign-out and profile commands.

use secrecy::SecretString;
use stoneart_storefront::state::Storefront;
use url::Url;

use super::{CliError, app};
use crate::render;

/// Print the URL that starts the OAuth sign-in.
pub fn begin_oauth(storefront: &Storefront) -> Result<(), CliError> {
    let url = storefront.session().begin_oauth("/").map_err(app)?;
    render::line(&format!("Sign in at: {url}"));
    render::line("Then run: stoneart login --jwt-url <the URL you were sent back to>");
    Ok(())
}

/// Finish the OAuth sign-in from the landing URL.
pub fn complete_oauth(storefront: &Storefront, landing: &Url) -> Result<(), CliError> {
    match storefront.session().complete_oauth(landing).map_err(app)? {
        Some(identity) => render::identity(Some(&identity)),
        None => render::line("No token in that URL; still signed out."),
    }
    Ok(())
}

pub async fn admin_login(
    storefront: &Storefront,
    email: &str,
    password: String,
) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let identity = storefront
        .session()
        .admin_login(email, &password)
        .await
        .map_err(app)?;
    render::identity(Some(&identity));
    Ok(())
}

pub fn logout(storefront: &Storefront) {
    storefront.session().logout();
    render::line("Signed out.");
}

pub fn whoami(storefront: &Storefront) {
    render::identity(storefront.session().identity().as_ref());
}

pub async fn profile(storefront: &Storefront) {
    let landed = storefront.session().visit("/profile");
    if landed != "/profile" {
        render::line(&format!("Redirected to {landed}"));
        return;
    }
    let page = storefront.profile_page().await;
    render::profile(&page, storefront.config().currency);
}

pub fn visit(storefront: &Storefront, path: &str) {
    let landed = storefront.session().visit(path);
    render::line(&landed);
}
