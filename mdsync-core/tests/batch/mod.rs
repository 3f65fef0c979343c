mod anchors;
mod linkage;
mod toc;
