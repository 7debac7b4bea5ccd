fn main() {
    uniffi::generate_scaffolding("src/huddle.udl").expect("failed to generate UniFFI scaffolding");

    // Keep the Java_org_webrtc_* JNI symbols so webrtc::InitAndroid() can
    // reach the bundled Java classes.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("android") {
        webrtc_sys_build::configure_jni_symbols()
            .expect("failed to configure JNI symbols for Android");
    }
}
