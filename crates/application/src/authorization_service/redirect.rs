use trustline_core::{AppError, AppResult};
use url::Url;

/// Appends the response parameters and `state` to a registered redirect target.
pub(super) fn build_redirect(
    redirect_uri: &str,
    parameters: &[(&str, &str)],
    state: Option<&str>,
) -> AppResult<String> {
    let mut url = Url::parse(redirect_uri).map_err(|error| {
        AppError::Internal(format!(
            "registered redirect uri '{redirect_uri}' is not a valid url: {error}"
        ))
    })?;

    {
        let mut query = url.query_pairs_mut();
        for (name, value) in parameters {
            query.append_pair(name, value);
        }
        if let Some(state) = state {
            query.append_pair("state", state);
        }
    }

    Ok(url.into())
}

/// Builds an OAuth error redirect.
pub(super) fn error_redirect(
    redirect_uri: &str,
    error: &AppError,
    state: Option<&str>,
) -> AppResult<String> {
    let description = match error {
        AppError::Internal(_) => "the authorization server encountered an internal error",
        other => other.description(),
    };

    build_redirect(
        redirect_uri,
        &[
            ("error", error.error_code()),
            ("error_description", description),
        ],
        state,
    )
}
