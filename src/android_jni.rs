//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to an `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Functions returning a string return null on failure; the cause is logged.

use jni::objects::{JClass, JString};
use jni::sys::{jdouble, jstring};
use jni::JNIEnv;
use log::warn;

use crate::distance::phrase_for_meters;
use crate::instructions::InstructionSynthesizer;

/// Installs the Android logger.
/// Maps to: RustBridge.init()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bikenav_app_RustBridge_init(_env: JNIEnv, _class: JClass) {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("bikenav"),
    );
}

/// Returns the library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bikenav_app_RustBridge_version(
    env: JNIEnv,
    _class: JClass,
) -> jstring {
    to_java_string(&env, crate::VERSION)
}

/// Spoken phrase for a distance in meters, e.g. "a quarter mile".
/// Maps to: RustBridge.phraseForDistance(meters: Double) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bikenav_app_RustBridge_phraseForDistance(
    env: JNIEnv,
    _class: JClass,
    meters: jdouble,
) -> jstring {
    to_java_string(&env, &phrase_for_meters(meters))
}

/// Annotates a raw backend route response with banner and voice instructions.
/// Maps to: RustBridge.annotateRoute(json: String) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bikenav_app_RustBridge_annotateRoute(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    let body: String = match env.get_string(&json) {
        Ok(s) => s.into(),
        Err(e) => {
            warn!("annotateRoute: invalid input string: {e}");
            return std::ptr::null_mut();
        }
    };

    match InstructionSynthesizer::default().annotate_to_json(body.as_bytes()) {
        Ok(annotated) => to_java_string(&env, &annotated),
        Err(e) => {
            warn!("annotateRoute: failed to decode route response: {e}");
            std::ptr::null_mut()
        }
    }
}

fn to_java_string(env: &JNIEnv, value: &str) -> jstring {
    match env.new_string(value) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            warn!("failed to create Java string: {e}");
            std::ptr::null_mut()
        }
    }
}
