use crate::models::CaptureRect;

/// Parses a region given as `X,Y,W,H` in CSS pixels
pub fn parse_rect(value: &str) -> Result<CaptureRect, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let &[x, y, width, height] = parts.as_slice() else {
        return Err(format!("expected X,Y,W,H, got `{}`", value));
    };
    let number = |s: &str| {
        s.parse::<u32>()
            .map_err(|e| format!("invalid number `{}`: {}", s, e))
    };
    Ok(CaptureRect {
        x: number(x)?,
        y: number(y)?,
        width: number(width)?,
        height: number(height)?,
    })
}

/// Parses `key=true` / `key=false`
pub fn parse_assignment(value: &str) -> Result<(String, bool), String> {
    let (key, flag) = value
        .split_once('=')
        .ok_or_else(|| format!("expected key=true|false, got `{}`", value))?;
    let flag = match flag.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => true,
        "false" | "off" | "0" => false,
        other => return Err(format!("`{}` is not a boolean", other)),
    };
    Ok((key.trim().to_string(), flag))
}
