//! The deployment block inserted after the link step

/// First line of an inserted block; its presence means "already patched"
pub const MARKER: &str = "# >>> qt-deploy (managed by netter-setup) >>>";

/// Written by older tooling that patched descriptors without a marker line
pub const LEGACY_MARKER: &str = "WINDEPLOYQT_EXECUTABLE";

const END_MARKER: &str = "# <<< qt-deploy <<<";

/// Copies the Qt runtime next to the built executable after every build:
/// windeployqt on Windows, linuxdeployqt on Linux when available, else an
/// `ldd`-based copy script generated into the build directory.
const BODY: &str = r##"if(WIN32)
    find_program(WINDEPLOYQT_EXECUTABLE windeployqt HINTS "${CMAKE_PREFIX_PATH}/bin")
    if(WINDEPLOYQT_EXECUTABLE)
        add_custom_command(TARGET ${PROJECT_NAME} POST_BUILD
            COMMAND ${WINDEPLOYQT_EXECUTABLE} --no-translations --no-system-d3d-compiler "$<TARGET_FILE:${PROJECT_NAME}>"
            COMMENT "Running windeployqt to copy Qt dependencies..."
        )
    else()
        message(WARNING "windeployqt not found, Qt dependencies will not be automatically copied")
    endif()
elseif(UNIX AND NOT APPLE)
    find_program(LINUXDEPLOYQT_EXECUTABLE linuxdeployqt HINTS "${CMAKE_PREFIX_PATH}/bin")
    if(LINUXDEPLOYQT_EXECUTABLE)
        add_custom_command(TARGET ${PROJECT_NAME} POST_BUILD
            COMMAND ${LINUXDEPLOYQT_EXECUTABLE} "$<TARGET_FILE:${PROJECT_NAME}>" -always-overwrite -no-translations
            COMMENT "Running linuxdeployqt to copy Qt dependencies..."
        )
    else()
        message(STATUS "linuxdeployqt not found, attempting to use qt-deploy")
        file(WRITE "${CMAKE_BINARY_DIR}/qt-deploy.sh"
            "#!/bin/bash\n"
            "echo 'Copying Qt dependencies...'\n"
            "EXECUTABLE=\"$<TARGET_FILE:${PROJECT_NAME}>\"\n"
            "DEST_DIR=\"$(dirname \"$EXECUTABLE\")\"\n"
            "ldd \"$EXECUTABLE\" | grep -i qt | awk '{print $3}' | xargs -I{} cp -v {} \"$DEST_DIR\"\n"
        )
        execute_process(COMMAND chmod +x "${CMAKE_BINARY_DIR}/qt-deploy.sh")
        add_custom_command(TARGET ${PROJECT_NAME} POST_BUILD
            COMMAND "${CMAKE_BINARY_DIR}/qt-deploy.sh"
            COMMENT "Running qt-deploy script to copy Qt dependencies..."
        )
    endif()
endif()
"##;

/// The block as inserted right after the anchor's closing parenthesis
pub fn render() -> String {
    format!("\n\n{MARKER}\n{BODY}{END_MARKER}\n")
}
