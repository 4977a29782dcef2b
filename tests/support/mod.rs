pub mod fbx_reader;
