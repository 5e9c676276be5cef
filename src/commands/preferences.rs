use crate::error::AppError;
use crate::market::persistence::{
    get_ui_preferences, save_ui_preferences, SaveUiPreferencesArgs, UiPreferencesSnapshot,
};
use crate::state::AppState;

pub async fn preferences_get(state: &AppState) -> Result<UiPreferencesSnapshot, AppError> {
    get_ui_preferences(&state.db_pool).await
}

/// Persists the preferences and folds them back into the in-memory settings
/// context, so persistence stays a side effect of the state transition.
pub async fn preferences_save(
    state: &AppState,
    args: SaveUiPreferencesArgs,
) -> Result<UiPreferencesSnapshot, AppError> {
    let snapshot = save_ui_preferences(&state.db_pool, &state.pairs, args).await?;

    {
        let mut settings = state.settings.write();
        settings.apply_preferences(&snapshot);
    }

    Ok(snapshot)
}
