//! Device tools that run against the connected target.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::app::adb::outcome::require_success;
use crate::app::adb::parse::{parse_getprop_value, parse_pm_list_packages};
use crate::app::context::ActionContext;
use crate::app::error::AppError;
use crate::app::models::{DeviceProperties, NotificationKind};

pub const SCREENSHOT_TEMP_PATH: &str = "/sdcard/temp_screenshot.png";
const APP_LIST_LIMIT: usize = 25;
const NOT_AVAILABLE: &str = "N/A";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

fn getprop(ctx: &ActionContext, target: &str, key: &str) -> String {
    let output = ctx
        .adb
        .run_on(Some(target), &["shell", "getprop", key], ctx.timeouts.default_timeout());
    if !output.is_success() {
        return NOT_AVAILABLE.to_string();
    }
    parse_getprop_value(&output.stdout).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_device_properties(target: &str, props: &DeviceProperties) -> String {
    format!(
        "Device {target}\n{}\nModel: {}\nManufacturer: {}\nBrand: {}\nAndroid: {}\nAPI level: {}\n",
        "=".repeat(30),
        props.model,
        props.manufacturer,
        props.brand,
        props.android_version,
        props.sdk_level
    )
}

pub fn device_info(ctx: &ActionContext) -> Result<DeviceProperties, AppError> {
    let target = ctx.require_target()?;
    ctx.reporter.info("Reading device information...");
    let props = DeviceProperties {
        model: getprop(ctx, &target, "ro.product.model"),
        manufacturer: getprop(ctx, &target, "ro.product.manufacturer"),
        android_version: getprop(ctx, &target, "ro.build.version.release"),
        sdk_level: getprop(ctx, &target, "ro.build.version.sdk"),
        brand: getprop(ctx, &target, "ro.product.brand"),
    };
    ctx.reporter.success("Device information retrieved");
    ctx.reporter.notify(
        NotificationKind::Info,
        "Device info",
        format_device_properties(&target, &props),
    );
    Ok(props)
}

/// First 25 names, then a count of the rest.
pub fn format_app_list(target: &str, packages: &[String]) -> String {
    let mut text = format!("Apps on {target} ({}):\n{}\n", packages.len(), "=".repeat(40));
    let shown: Vec<&str> = packages
        .iter()
        .take(APP_LIST_LIMIT)
        .map(String::as_str)
        .collect();
    text.push_str(&shown.join("\n"));
    if packages.len() > APP_LIST_LIMIT {
        text.push_str(&format!("\n... and {} more", packages.len() - APP_LIST_LIMIT));
    }
    text
}

pub fn list_apps(ctx: &ActionContext) -> Result<Vec<String>, AppError> {
    let target = ctx.require_target()?;
    ctx.reporter.info("Listing installed apps...");
    let output = ctx.adb.run_on(
        Some(&target),
        &["shell", "pm", "list", "packages", "-3"],
        ctx.timeouts.default_timeout(),
    );
    require_success(&output, "pm list packages", ctx.trace_id())?;
    let packages = parse_pm_list_packages(&output.stdout);
    ctx.reporter
        .success(format!("{} apps found", packages.len()));
    ctx.reporter.notify(
        NotificationKind::Info,
        "Installed apps",
        format_app_list(&target, &packages),
    );
    Ok(packages)
}

pub fn png_bytes_to_data_url(bytes: &[u8]) -> Result<String, String> {
    if bytes.len() < PNG_SIGNATURE.len() {
        return Err("Screenshot data is empty".to_string());
    }
    if !bytes.starts_with(PNG_SIGNATURE) {
        return Err("Screenshot data is not a PNG".to_string());
    }
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

/// screencap to a temp file on the device, pull it, then remove the temp file.
pub fn screenshot(ctx: &ActionContext, save_path: &str) -> Result<String, AppError> {
    let target = ctx.require_target()?;
    let save_path = save_path.trim();
    if save_path.is_empty() {
        return Err(AppError::validation("save path is required", ctx.trace_id()));
    }
    ctx.reporter.info("Taking screenshot...");

    let capture = ctx.adb.run_on(
        Some(&target),
        &["shell", "screencap", "-p", SCREENSHOT_TEMP_PATH],
        ctx.timeouts.default_timeout(),
    );
    require_success(&capture, "screencap", ctx.trace_id())?;
    ctx.check_cancelled()?;

    let pulled = ctx.adb.run_on(
        Some(&target),
        &["pull", SCREENSHOT_TEMP_PATH, save_path],
        ctx.timeouts.default_timeout(),
    );
    require_success(&pulled, "pull screenshot", ctx.trace_id())?;
    ctx.adb.run_on(
        Some(&target),
        &["shell", "rm", SCREENSHOT_TEMP_PATH],
        ctx.timeouts.default_timeout(),
    );

    let preview = fs::read(Path::new(save_path))
        .map_err(|err| err.to_string())
        .and_then(|bytes| png_bytes_to_data_url(&bytes));
    let preview = match preview {
        Ok(url) => Some(url),
        Err(message) => {
            ctx.reporter.warn(format!("No preview available: {message}"));
            None
        }
    };
    ctx.reporter.success("Screenshot saved");
    ctx.reporter.notify_with_preview(
        NotificationKind::Info,
        "Screenshot",
        format!("Screenshot saved to:\n{save_path}"),
        preview,
    );
    Ok(save_path.to_string())
}
