use anyhow::Result;
use serde::Serialize;

use larder_core::ShareOutcome;
use larder_core::notice::Notice;

use super::App;
use super::helpers::report;

pub(crate) async fn cmd_share(app: &App, id: &str, json: bool) -> Result<()> {
    app.load().await?;
    let recipe = app.recipe_or_exit(id, json);
    let url = app.share.locator(&recipe.id);
    let result = app.share.share(&recipe.id, &recipe.title).await;

    if json {
        #[derive(Serialize)]
        struct ShareJson<'a> {
            outcome: Option<ShareOutcome>,
            url: &'a str,
            #[serde(flatten)]
            notice: Notice,
        }
        let out = ShareJson {
            outcome: result.as_ref().ok().copied(),
            url: &url,
            notice: Notice::for_share(&result),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let notice = Notice::for_share(&result);
    if notice.is_error() {
        // Still give the user something to paste by hand.
        eprintln!("{url}");
    }
    report(&notice, false)
}
