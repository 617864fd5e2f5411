use anyhow::Result;
use dialoguer::Confirm;

pub fn ask_confirm(yes: bool, msg: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }

    let prefix = super::gen_prefix("");
    let msg = format!("{prefix}{msg}");
    let res = Confirm::new().with_prompt(msg).default(false).interact()?;
    Ok(res)
}
