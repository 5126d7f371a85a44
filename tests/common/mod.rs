//! Common test utilities for netter-setup integration tests

use std::path::PathBuf;
use tempfile::TempDir;

/// A CMakeLists.txt with a deployment anchor
#[allow(dead_code)]
pub const DESCRIPTOR: &str = "cmake_minimum_required(VERSION 3.16)\n\
project(Netter LANGUAGES CXX)\n\
find_package(Qt6 REQUIRED COMPONENTS Widgets)\n\
add_executable(Netter main.cpp)\n\
target_link_libraries(Netter PRIVATE Qt6::Widgets)\n";

/// A temporary project directory
pub struct TestProject {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// A project with the default descriptor already in place
    #[allow(dead_code)]
    pub fn with_descriptor() -> Self {
        let project = Self::new();
        project.write_file("CMakeLists.txt", DESCRIPTOR);
        project
    }

    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    #[allow(dead_code)]
    pub fn read_bytes(&self, path: &str) -> Vec<u8> {
        std::fs::read(self.path.join(path)).expect("Failed to read file")
    }

    #[allow(dead_code)]
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
